//! Length-prefixed JSON framing shared by every transport (SPEC_FULL.md
//! §4.7): a 4-byte little-endian length prefix followed by a JSON object,
//! mirroring `pitwall-codec`'s own fixed-width little-endian framing
//! convention. Generic over the stream type so `TcpStream` and
//! `UnixStream` share one read/write path.

use std::io;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// A single frame larger than this is rejected rather than allocated, so a
/// corrupt or malicious length prefix can't force an unbounded allocation.
const MAX_FRAME_LEN: u32 = 1024 * 1024;

pub async fn read_frame<R, T>(reader: &mut R) -> io::Result<T>
where
    R: AsyncRead + Unpin + Send,
    T: DeserializeOwned,
{
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await?;
    let len = u32::from_le_bytes(len_buf);
    if len > MAX_FRAME_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame length {len} exceeds the {MAX_FRAME_LEN} byte limit"),
        ));
    }
    let mut body = vec![0u8; len as usize];
    reader.read_exact(&mut body).await?;
    serde_json::from_slice(&body).map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error))
}

pub async fn write_frame<W, T>(writer: &mut W, value: &T) -> io::Result<()>
where
    W: AsyncWrite + Unpin + Send,
    T: Serialize,
{
    let body = serde_json::to_vec(value)
        .map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error))?;
    let len = u32::try_from(body.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "frame too large to encode"))?;
    writer.write_all(&len.to_le_bytes()).await?;
    writer.write_all(&body).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        value: u32,
    }

    #[tokio::test]
    async fn a_written_frame_reads_back_the_same_value() {
        let mut buffer = Vec::new();
        write_frame(&mut buffer, &Sample { value: 7 }).await.expect("write");

        let mut cursor = std::io::Cursor::new(buffer);
        let decoded: Sample = read_frame(&mut cursor).await.expect("read");
        assert_eq!(decoded, Sample { value: 7 });
    }

    #[tokio::test]
    async fn an_oversized_length_prefix_is_rejected() {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&(MAX_FRAME_LEN + 1).to_le_bytes());
        let mut cursor = std::io::Cursor::new(buffer);
        let result: io::Result<Sample> = read_frame(&mut cursor).await;
        assert!(result.is_err());
    }
}
