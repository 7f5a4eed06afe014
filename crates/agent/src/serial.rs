//! Request/response loop over the JIG serial line.
//!
//! Frames are `#`-terminated; bytes between frames (line endings, noise)
//! are skipped by the request decoder. Each request is answered before
//! the next one is read.

use jig_core::protocol::{Request, Response, REQUEST_SIZE};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::dispatcher::Dispatcher;

const FRAME_END: u8 = b'#';

/// Bytes kept while waiting for a terminator. Older bytes are dropped;
/// a frame never needs more than its last [`REQUEST_SIZE`] bytes.
const MAX_PENDING: usize = 4 * REQUEST_SIZE;

/// Read up to and including the next `#`, keeping at most [`MAX_PENDING`]
/// trailing bytes. Returns 0 at end of stream.
async fn read_frame<R>(reader: &mut R, buf: &mut Vec<u8>) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(buf.len());
        }

        let (chunk, complete) = match available.iter().position(|&b| b == FRAME_END) {
            Some(end) => (&available[..=end], true),
            None => (available, false),
        };
        buf.extend_from_slice(chunk);
        let used = chunk.len();
        reader.consume(used);

        if buf.len() > MAX_PENDING {
            let excess = buf.len() - MAX_PENDING;
            buf.drain(..excess);
        }
        if complete {
            return Ok(buf.len());
        }
    }
}

/// Write a single response record and flush it to the line.
pub async fn send<W>(writer: &mut W, response: &Response) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(response.encode().as_bytes()).await?;
    writer.flush().await
}

/// Serve requests until the reader reaches end of stream.
///
/// Returns the number of requests answered.
pub async fn serve<R, W>(dispatcher: &Dispatcher, mut reader: R, mut writer: W) -> std::io::Result<u64>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::with_capacity(64);
    let mut answered = 0;

    loop {
        if read_frame(&mut reader, &mut buf).await? == 0 {
            break;
        }

        let raw = String::from_utf8_lossy(&buf);
        if raw.trim().is_empty() {
            continue;
        }

        let request = match Request::decode(&raw) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(frame = %raw.escape_debug(), error = %e, "Dropping malformed frame");
                continue;
            }
        };

        tracing::debug!(?request, "Request received");
        let response = dispatcher.handle(&request).await;
        send(&mut writer, &response).await?;
        answered += 1;
    }

    tracing::info!(answered, "Serial stream closed");
    Ok(answered)
}

#[cfg(test)]
mod tests {
    use jig_core::protocol::{Status, RESPONSE_SIZE};
    use tokio::io::BufReader;

    use super::*;

    #[tokio::test]
    async fn answers_each_frame_and_skips_garbage() {
        let dispatcher = Dispatcher::new();
        let input = b"\r\n@C000105000I000000#\r\nnoise#@C000199000R000000#\r\n";
        let mut out = Vec::new();

        let answered = serve(&dispatcher, BufReader::new(&input[..]), &mut out)
            .await
            .unwrap();
        assert_eq!(answered, 2);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.split_inclusive('\n').collect();
        assert_eq!(lines.len(), 2);
        for line in &lines {
            assert_eq!(line.len(), RESPONSE_SIZE);
        }

        let first = Response::decode(lines[0]).unwrap();
        assert_eq!(first.gid, 5);
        assert_eq!(first.status, Status::Fail);
        assert_eq!(first.data, "000000");

        // gid 99 is not a known group; the request is still answered.
        let second = Response::decode(lines[1]).unwrap();
        assert_eq!(second.gid, 99);
        assert_eq!(second.status, Status::Fail);
    }

    #[tokio::test]
    async fn empty_stream_answers_nothing() {
        let dispatcher = Dispatcher::new();
        let mut out = Vec::new();
        let answered = serve(&dispatcher, BufReader::new(&b""[..]), &mut out)
            .await
            .unwrap();
        assert_eq!(answered, 0);
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn ready_announcement_is_one_record() {
        let mut out = Vec::new();
        send(&mut out, &Response::ready()).await.unwrap();
        assert_eq!(out.len(), RESPONSE_SIZE);
        assert!(out.starts_with(b"@,S,00,0000,I,"));
    }

    #[tokio::test]
    async fn truncated_frame_does_not_swallow_the_next() {
        let dispatcher = Dispatcher::new();
        let input = b"@C0001\r\n@C000105000I000000#\r\n";
        let mut out = Vec::new();

        let answered = serve(&dispatcher, BufReader::new(&input[..]), &mut out)
            .await
            .unwrap();
        assert_eq!(answered, 1);
        assert_eq!(Response::decode(&String::from_utf8(out).unwrap()).unwrap().gid, 5);
    }

    #[tokio::test]
    async fn long_noise_without_terminator_is_bounded() {
        let mut input = vec![b'x'; 10_000];
        input.extend_from_slice(b"@C000105000I000000#");
        let mut reader = BufReader::with_capacity(64, &input[..]);
        let mut buf = Vec::new();

        let len = read_frame(&mut reader, &mut buf).await.unwrap();
        assert_eq!(len, MAX_PENDING);
        assert!(buf.ends_with(b"@C000105000I000000#"));
        assert_eq!(read_frame(&mut reader, &mut buf).await.unwrap(), 0);
    }
}
