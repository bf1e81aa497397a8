//! Account and enrollment commands.
//!
//! # Usage
//!
//! ```bash
//! # Sign in with an email or username
//! learnhub account login -i ada -p secret
//!
//! # Register a new account
//! learnhub account register -u ada -e ada@example.com -p secret
//!
//! # Show the session restored from LEARNHUB_ACCESS_TOKEN
//! learnhub account whoami
//! ```
//!
//! # Environment Variables
//!
//! - `LEARNHUB_ACCESS_TOKEN` - Session token for commands that need an
//!   already-authenticated session (`whoami`, `enroll`, `enrollments`)

use learnhub_client::models::CurrentUser;
use learnhub_client::{AppError, AppState};
use learnhub_core::{CourseId, Role};

/// Sign in and print the resolved profile.
pub async fn login(state: &AppState, identifier: &str, password: &str) -> Result<(), AppError> {
    let user = state.session().login(identifier, password).await?;
    print_user(&user);
    Ok(())
}

/// Register a new account.
pub async fn register(
    state: &AppState,
    username: &str,
    email: &str,
    password: &str,
    role: Role,
) -> Result<(), AppError> {
    let session_established = state
        .session()
        .register(username, email, password, role)
        .await?;

    if session_established {
        match state.session().current_user() {
            Some(user) => print_user(&user),
            None => println!("Registered and signed in."),
        }
    } else {
        println!("Account created; sign-in did not complete. Check your inbox or log in manually.");
    }
    Ok(())
}

/// Print the profile of the restored session.
pub async fn whoami(state: &AppState) -> Result<(), AppError> {
    let user = require_session(state).await?;
    print_user(&user);
    Ok(())
}

/// Enroll the signed-in user in a course.
pub async fn enroll(state: &AppState, course_id: CourseId) -> Result<(), AppError> {
    let user = require_session(state).await?;
    state.courses().enroll(course_id, user.id).await?;
    println!("Enrolled in {course_id}.");
    Ok(())
}

/// List the signed-in user's enrollments with progress.
pub async fn enrollments(state: &AppState) -> Result<(), AppError> {
    let user = require_session(state).await?;
    let enrolled = state.courses().enrolled_courses(user.id).await?;

    if enrolled.is_empty() {
        println!("No enrollments.");
        return Ok(());
    }

    for entry in enrolled {
        println!(
            "{}  {}  {}%  ({} lessons)",
            entry.course.id, entry.course.title, entry.progress, entry.total_lessons
        );
    }
    Ok(())
}

/// Restore the stored session or fail with a sign-in hint.
async fn require_session(state: &AppState) -> Result<CurrentUser, AppError> {
    state
        .session()
        .bootstrap(state.config().bootstrap_timeout)
        .await;

    state.session().current_user().ok_or_else(|| {
        AppError::Unauthorized(
            "no active session; set LEARNHUB_ACCESS_TOKEN or log in".to_string(),
        )
    })
}

fn print_user(user: &CurrentUser) {
    println!("{}", user.display_name());
    println!("  id:    {}", user.id);
    if let Some(email) = &user.email {
        println!("  email: {email}");
    }
    println!("  role:  {}", user.role.as_str());
    if let Some(avatar) = &user.avatar_url {
        println!("  avatar: {avatar}");
    }
}
