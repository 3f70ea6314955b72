//! Receipt-handle augmentation.
//!
//! When a received message is rehydrated from the store, the location of its
//! payload object must survive until the consumer deletes the message, so the
//! pointer is folded into the receipt handle itself:
//!
//! ```text
//! -..s3BucketName..-{bucket}-..s3BucketName..--..s3Key..-{key}-..s3Key..-{original}
//! ```
//!
//! Extraction splits on the first and second occurrence of each marker. A
//! bucket or key containing a marker string would mis-split, but generated
//! keys are UUIDs and bucket names cannot contain uppercase characters, so
//! neither can collide with a marker in practice.

use crate::pointer::PayloadPointer;

/// Delimits the bucket name inside an augmented receipt handle.
pub const BUCKET_NAME_MARKER: &str = "-..s3BucketName..-";

/// Delimits the object key inside an augmented receipt handle.
pub const KEY_MARKER: &str = "-..s3Key..-";

/// Fold a payload pointer into a receipt handle.
#[must_use]
pub fn embed(original_handle: &str, pointer: &PayloadPointer) -> String {
    let mut handle = String::with_capacity(
        original_handle.len()
            + pointer.bucket.len()
            + pointer.key.len()
            + 2 * (BUCKET_NAME_MARKER.len() + KEY_MARKER.len()),
    );
    handle.push_str(BUCKET_NAME_MARKER);
    handle.push_str(&pointer.bucket);
    handle.push_str(BUCKET_NAME_MARKER);
    handle.push_str(KEY_MARKER);
    handle.push_str(&pointer.key);
    handle.push_str(KEY_MARKER);
    handle.push_str(original_handle);
    handle
}

/// Whether a receipt handle carries an embedded payload pointer.
#[must_use]
pub fn is_offloaded(handle: &str) -> bool {
    handle.contains(BUCKET_NAME_MARKER) && handle.contains(KEY_MARKER)
}

/// The original queue receipt handle, with the embedded pointer stripped.
///
/// Returns `None` when the handle was never augmented.
#[must_use]
pub fn original_handle(handle: &str) -> Option<&str> {
    let end = second_occurrence(handle, KEY_MARKER)?;
    Some(&handle[end + KEY_MARKER.len()..])
}

/// The payload pointer embedded in an augmented receipt handle, if any.
#[must_use]
pub fn extract_pointer(handle: &str) -> Option<PayloadPointer> {
    let bucket = between_markers(handle, BUCKET_NAME_MARKER)?;
    let key = between_markers(handle, KEY_MARKER)?;
    Some(PayloadPointer::new(bucket, key))
}

fn between_markers<'a>(haystack: &'a str, marker: &str) -> Option<&'a str> {
    let start = haystack.find(marker)? + marker.len();
    let end = haystack[start..].find(marker)? + start;
    Some(&haystack[start..end])
}

fn second_occurrence(haystack: &str, needle: &str) -> Option<usize> {
    let first = haystack.find(needle)? + needle.len();
    Some(first + haystack[first..].find(needle)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embed_produces_marker_delimited_layout() {
        let pointer = PayloadPointer::new("my-bucket", "my-key");
        let handle = embed("AQEBzJ3c=", &pointer);
        assert_eq!(
            handle,
            "-..s3BucketName..-my-bucket-..s3BucketName..--..s3Key..-my-key-..s3Key..-AQEBzJ3c="
        );
    }

    #[test]
    fn augmented_handle_round_trips() {
        let pointer = PayloadPointer::new("payloads", "4cd1cd18-3f6b-4eaa-b0b4-7ad4e4691b47");
        let handle = embed("AQEB/original+handle==", &pointer);

        assert!(is_offloaded(&handle));
        assert_eq!(original_handle(&handle), Some("AQEB/original+handle=="));
        assert_eq!(extract_pointer(&handle), Some(pointer));
    }

    #[test]
    fn plain_handle_is_not_offloaded() {
        let handle = "AQEBzJ3cMKx5pFVuQG5c=";
        assert!(!is_offloaded(handle));
        assert_eq!(original_handle(handle), None);
        assert_eq!(extract_pointer(handle), None);
    }

    #[test]
    fn handle_with_single_marker_is_not_offloaded() {
        let handle = format!("{BUCKET_NAME_MARKER}b{BUCKET_NAME_MARKER}no-key-section");
        assert!(!is_offloaded(&handle));
        assert_eq!(extract_pointer(&handle), None);
    }

    #[test]
    fn original_handle_may_itself_contain_markers() {
        // Re-augmenting an already augmented handle must strip one layer only.
        let pointer = PayloadPointer::new("bucket", "key");
        let inner = embed("AQEB123=", &pointer);
        let outer = embed(&inner, &PayloadPointer::new("outer-bucket", "outer-key"));

        assert_eq!(
            extract_pointer(&outer),
            Some(PayloadPointer::new("outer-bucket", "outer-key"))
        );
        assert_eq!(original_handle(&outer), Some(inner.as_str()));
    }

    #[test]
    fn empty_original_handle_survives() {
        let pointer = PayloadPointer::new("bucket", "key");
        let handle = embed("", &pointer);
        assert_eq!(original_handle(&handle), Some(""));
    }
}
