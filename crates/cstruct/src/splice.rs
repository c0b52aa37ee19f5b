//! Copying a header record and a raw body into a target instance.

use crate::instance::Instance;

/// Name of the member whose size is used as the header length when no header is given.
const HEADER_MEMBER: &str = "header";

/// Copies `header` to the start of `target`, then as many `body` bytes as fit after it.
///
/// Without a header instance the body starts after the target's `header` member, or at
/// offset 0 if it has none. Returns the number of body bytes copied.
pub fn fill_head_body(
    target: &mut Instance,
    header: Option<&Instance>,
    body: Option<&[u8]>,
) -> usize {
    let size = target.size();

    let head_len = match header {
        Some(header) => {
            let len = header.size().min(size);
            target.as_bytes_mut()[..len].copy_from_slice(&header.as_bytes()[..len]);
            header.size()
        }
        None => target
            .record_type()
            .member(HEADER_MEMBER)
            .map(|(field, _)| field.ty.size())
            .unwrap_or(0),
    };

    let Some(body) = body else {
        return 0;
    };

    let start = head_len.min(size);
    let copied = body.len().min(size - start);
    target.as_bytes_mut()[start..start + copied].copy_from_slice(&body[..copied]);
    log::debug!(
        "spliced {} header and {} body bytes into {}",
        start,
        copied,
        target.record_type().name()
    );
    copied
}
