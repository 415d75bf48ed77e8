use std::io::{self, Read, Write};

use memchr::{memchr, memrchr};

use super::dispatch::CaseConverter;

/// Initial read buffer. Doubles whenever a single line does not fit.
const STREAM_BUF: usize = 256 * 1024;

/// Convert every line from `reader` and write it to `writer`.
///
/// Each line, terminator included, is converted on its own in the read
/// buffer. A trailing line without `\n` is converted at EOF.
/// Returns the number of lines converted.
pub fn convert_stream(
    conv: &CaseConverter,
    reader: &mut impl Read,
    writer: &mut impl Write,
) -> io::Result<u64> {
    let mut buf = vec![0u8; STREAM_BUF];
    // Bytes of an unterminated line carried over from the previous read.
    let mut filled = 0;
    let mut lines = 0u64;

    loop {
        if filled == buf.len() {
            buf.resize(buf.len() * 2, 0);
        }
        let n = match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => n,
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        // The carried bytes hold no terminator, only the new ones can.
        let scanned = filled;
        filled += n;
        let Some(last) = memrchr(b'\n', &buf[scanned..filled]) else {
            continue;
        };
        let end = scanned + last + 1;
        lines += convert_lines(conv, &mut buf[..end]);
        writer.write_all(&buf[..end])?;
        buf.copy_within(end..filled, 0);
        filled -= end;
    }

    if filled > 0 {
        conv.convert_line(&mut buf[..filled]);
        writer.write_all(&buf[..filled])?;
        lines += 1;
    }
    Ok(lines)
}

/// Convert in-memory `data` line by line and write the result.
/// Returns the number of lines converted.
pub fn convert_bytes(conv: &CaseConverter, data: &[u8], out: &mut impl Write) -> io::Result<u64> {
    if data.is_empty() {
        return Ok(0);
    }
    let mut output = data.to_vec();
    let lines = convert_lines(conv, &mut output);
    out.write_all(&output)?;
    Ok(lines)
}

/// Convert each line of `data` in place, the last one may be unterminated.
fn convert_lines(conv: &CaseConverter, data: &mut [u8]) -> u64 {
    let mut start = 0;
    let mut lines = 0;
    while let Some(pos) = memchr(b'\n', &data[start..]) {
        let end = start + pos + 1;
        conv.convert_line(&mut data[start..end]);
        start = end;
        lines += 1;
    }
    if start < data.len() {
        conv.convert_line(&mut data[start..]);
        lines += 1;
    }
    lines
}
