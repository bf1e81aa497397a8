//! Object storage upload and public-URL retrieval.
//!
//! Thumbnails go to the `course-thumbnails` bucket, lesson files to
//! `lesson-content`, avatars to `avatars`. Objects are keyed under the
//! owner's id with a timestamp-plus-random name so repeated uploads of the
//! same filename never collide.

use chrono::Utc;
use rand::Rng;
use reqwest::Method;

use learnhub_core::UserId;

use super::{SupabaseClient, SupabaseError};

/// Length of the random suffix in generated object names.
const NAME_SUFFIX_LEN: usize = 9;

impl SupabaseClient {
    /// Upload a file and return its public URL.
    ///
    /// The object is stored as `{owner}/{timestamp}_{random}.{ext}`, where
    /// `ext` is taken from the supplied filename.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` if the upload is rejected or the transport
    /// fails.
    pub async fn upload_public(
        &self,
        bucket: &str,
        owner: UserId,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, SupabaseError> {
        let path = object_path(owner, filename);

        let request = self
            .request(Method::POST, self.storage_url(&format!("object/{bucket}/{path}")))
            .await
            .header("Content-Type", content_type)
            .body(bytes);
        self.send_ok(request).await?;

        Ok(self.public_url(bucket, &path))
    }

    /// The public URL for an object in a public bucket.
    ///
    /// Purely deterministic string construction; no remote call is made.
    #[must_use]
    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        self.storage_url(&format!("object/public/{bucket}/{path}"))
    }
}

/// Build the object path for an upload: owner prefix, millisecond
/// timestamp, random lowercase-alphanumeric suffix, original extension.
fn object_path(owner: UserId, filename: &str) -> String {
    let ext = filename.rsplit_once('.').map_or("bin", |(_, ext)| ext);
    let timestamp = Utc::now().timestamp_millis();
    let suffix = random_suffix();

    format!("{owner}/{timestamp}_{suffix}.{ext}")
}

fn random_suffix() -> String {
    const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();

    (0..NAME_SUFFIX_LEN)
        .map(|_| {
            let idx = rng.random_range(0..ALPHABET.len());
            char::from(ALPHABET[idx])
        })
        .collect()
}
