//! Fixed-width numeric formatting into caller-provided buffers.
//!
//! Both formatters write right-aligned text into the whole `field` slice and
//! return the number of bytes left unwritten at its start. When the field is
//! too narrow, the most significant digits are silently dropped.

const DECIMAL_COUNT: usize = 2;

/// Writes `value` as decimal digits right-aligned in `field`. Returns the
/// remaining width.
pub fn format_integer(mut value: u64, field: &mut [u8]) -> usize {
    let mut width = field.len();
    if width == 0 {
        return 0;
    }

    loop {
        width -= 1;
        field[width] = b'0' + (value % 10) as u8;
        if width == 0 {
            return 0;
        }
        value /= 10;
        if value == 0 {
            return width;
        }
    }
}

/// Writes a nanosecond duration as milliseconds with two decimal digits,
/// right-aligned in `field`. Returns the remaining width.
///
/// Values below 1 ms keep a leading `0.` (`0.05`, `0.00`).
pub fn format_duration(nanoseconds: u64, field: &mut [u8]) -> usize {
    let mut width = field.len();
    if width == 0 {
        return 0;
    }

    // Hundredths of milliseconds.
    let mut value = nanoseconds / 10_000;
    let mut written = 0;

    loop {
        width -= 1;
        field[width] = b'0' + (value % 10) as u8;
        if width == 0 {
            return 0;
        }
        value /= 10;
        written += 1;
        if written == DECIMAL_COUNT || value == 0 {
            break;
        }
    }

    if value != 0 {
        width -= 1;
        field[width] = b'.';
        while width > 0 {
            width -= 1;
            field[width] = b'0' + (value % 10) as u8;
            value /= 10;
            if value == 0 {
                break;
            }
        }
    } else {
        if written == 1 {
            width -= 1;
            field[width] = b'0';
            if width == 0 {
                return 0;
            }
        }
        width -= 1;
        field[width] = b'.';
        if width > 0 {
            width -= 1;
            field[width] = b'0';
        }
    }

    width
}

/// Writes `text` right-aligned in `field`, dropping its leading bytes if the
/// field is too narrow. Returns the remaining width.
pub fn format_str(text: &[u8], field: &mut [u8]) -> usize {
    let len = text.len().min(field.len());
    let width = field.len() - len;
    field[width..].copy_from_slice(&text[text.len() - len..]);
    width
}
