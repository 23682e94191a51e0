//! Human-readable rendering of torrents and sizes.

use std::io::{self, Write};

use crate::Torrent;

const DECIMAL_SUFFIXES: [&str; 8] = ["kB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];
const BINARY_SUFFIXES: [&str; 8] = ["KiB", "MiB", "GiB", "TiB", "PiB", "EiB", "ZiB", "YiB"];

/// Formats a byte count with one decimal, in powers of 1000 or, with
/// `binary`, powers of 1024.
pub fn natural_size(bytes: u64, binary: bool) -> String {
    let (base, suffixes) = if binary {
        (1024.0, &BINARY_SUFFIXES)
    } else {
        (1000.0, &DECIMAL_SUFFIXES)
    };
    if bytes == 1 {
        return "1 Byte".to_string();
    }
    let value = bytes as f64;
    if value < base {
        return format!("{bytes} Bytes");
    }
    let mut unit = base;
    for suffix in suffixes.iter() {
        unit *= base;
        if value < unit {
            return format!("{:.1} {}", value * base / unit, suffix);
        }
    }
    format!("{:.1} {}", value * base / unit, suffixes[suffixes.len() - 1])
}

/// One line of a torrent listing.
pub fn torrent_line(t: &Torrent) -> String {
    format!(
        "[{:>4}] {:>4.0}% {:>6.2} {:>10} {:<16} {}",
        t.id,
        t.percent_done * 100.0,
        t.ratio,
        natural_size(t.total_size, true),
        t.status,
        t.name
    )
}

pub fn write_torrents<W: Write>(out: &mut W, torrents: &[Torrent]) -> io::Result<()> {
    for t in torrents {
        writeln!(out, "{}", torrent_line(t))?;
    }
    Ok(())
}
