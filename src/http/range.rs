//! HTTP Range request negotiation module
//!
//! Turns an optional `Range` header into a delivery plan for a file of known size.
//! Only a single `bytes` range is supported; anything else that is present but not
//! servable is answered with 416 rather than silently falling back to the full body.

use crate::error::FileError;

/// How much of a file to send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryPlan {
    /// Whole file, status 200
    Full { size: u64 },
    /// Inclusive byte range `[start, end]`, status 206
    Partial { start: u64, end: u64, size: u64 },
}

impl DeliveryPlan {
    /// Offset of the first byte to send
    #[inline]
    pub const fn start(&self) -> u64 {
        match self {
            Self::Full { .. } => 0,
            Self::Partial { start, .. } => *start,
        }
    }

    /// Number of body bytes to send
    #[inline]
    pub const fn content_length(&self) -> u64 {
        match self {
            Self::Full { size } => *size,
            Self::Partial { start, end, .. } => *end - *start + 1,
        }
    }

    pub const fn is_partial(&self) -> bool {
        matches!(self, Self::Partial { .. })
    }

    /// `Content-Range` header value for partial plans
    pub fn content_range(&self) -> Option<String> {
        match self {
            Self::Full { .. } => None,
            Self::Partial { start, end, size } => Some(format!("bytes {start}-{end}/{size}")),
        }
    }
}

/// Negotiate the delivery plan for a file of `file_size` bytes
///
/// Supported formats:
/// - absent header - full file
/// - `bytes=start-end` - specific range
/// - `bytes=start-` - from start to end of file
/// - `bytes=-suffix` - last suffix bytes (whole file when suffix exceeds it)
///
/// # Examples
/// ```
/// use secure_fileserver::http::range::{negotiate, DeliveryPlan};
///
/// let plan = negotiate(Some("bytes=2-5"), 10).unwrap();
/// assert_eq!(plan, DeliveryPlan::Partial { start: 2, end: 5, size: 10 });
/// assert_eq!(plan.content_length(), 4);
///
/// assert_eq!(negotiate(None, 10).unwrap(), DeliveryPlan::Full { size: 10 });
/// assert!(negotiate(Some("bytes=10-"), 10).is_err());
/// ```
pub fn negotiate(range_header: Option<&str>, file_size: u64) -> Result<DeliveryPlan, FileError> {
    let Some(header) = range_header else {
        return Ok(DeliveryPlan::Full { size: file_size });
    };
    let unsatisfiable = FileError::RangeNotSatisfiable { size: file_size };

    let header = header.trim();
    let Some(spec) = header
        .get(..6)
        .filter(|unit| unit.eq_ignore_ascii_case("bytes="))
        .map(|_| &header[6..])
    else {
        return Err(unsatisfiable);
    };

    // Only a single range (no multipart)
    if spec.contains(',') {
        return Err(unsatisfiable);
    }

    let Some((start_str, end_str)) = spec.split_once('-') else {
        return Err(unsatisfiable);
    };
    let (start_str, end_str) = (start_str.trim(), end_str.trim());

    let (start, end) = if start_str.is_empty() {
        // Suffix range: "-500" means last 500 bytes
        let suffix = parse_offset(end_str).ok_or_else(|| unsatisfiable.clone())?;
        if suffix == 0 || file_size == 0 {
            return Err(unsatisfiable);
        }
        (file_size.saturating_sub(suffix), file_size - 1)
    } else {
        let start = parse_offset(start_str).ok_or_else(|| unsatisfiable.clone())?;
        let end = if end_str.is_empty() {
            file_size.saturating_sub(1)
        } else {
            parse_offset(end_str).ok_or_else(|| unsatisfiable.clone())?
        };
        (start, end)
    };

    if start >= file_size || end >= file_size || start > end {
        return Err(unsatisfiable);
    }

    Ok(DeliveryPlan::Partial {
        start,
        end,
        size: file_size,
    })
}

/// Parse a byte offset made of ASCII digits only
fn parse_offset(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
