use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};

/// Largest frame accepted from a peer (100MB)
pub const MAX_FRAME_LEN: usize = 100 * 1024 * 1024;

fn closed_on_eof(e: std::io::Error) -> Error {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        Error::ConnectionClosed
    } else {
        e.into()
    }
}

/// Read one length-prefixed frame
///
/// Messages are sent with a 4-byte big-endian length prefix.
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>> {
    let len = reader.read_u32().await.map_err(closed_on_eof)? as usize;

    if len > MAX_FRAME_LEN {
        return Err(Error::InvalidFrame(format!(
            "Message too large: {} bytes",
            len
        )));
    }

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).await.map_err(closed_on_eof)?;
    Ok(buf)
}

/// Write one length-prefixed frame and flush it
pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, bytes: &[u8]) -> Result<()> {
    let len = u32::try_from(bytes.len())
        .map_err(|_| Error::InvalidFrame(format!("Message too large: {} bytes", bytes.len())))?;
    writer.write_u32(len).await?;
    writer.write_all(bytes).await?;
    writer.flush().await?;
    Ok(())
}

/// Run `op`, bounded by `timeout` when one is set
pub(crate) async fn bounded<T, F>(
    timeout: Option<std::time::Duration>,
    what: &'static str,
    op: F,
) -> Result<T>
where
    F: std::future::Future<Output = Result<T>>,
{
    match timeout {
        Some(timeout) => tokio::time::timeout(timeout, op)
            .await
            .map_err(|_| Error::Timeout(what))?,
        None => op.await,
    }
}
