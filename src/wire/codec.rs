//! Wire protocol line codec
//!
//! The wire protocol is line oriented: every request and response is a
//! single JSON array on its own line, terminated by CRLF.
//! ```text
//! ["step_matches", {"name_to_match": "a calculator"}]\r\n
//! ["success", [{"id": "1", "args": []}]]\r\n
//! ```

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::common::Error;

/// Write one request line to the stream, CRLF terminated
pub async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, line: &str) -> Result<(), Error> {
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\r\n").await?;
    writer.flush().await?;
    Ok(())
}

/// Read one response line from the stream
///
/// Strips the trailing line terminator. EOF before any bytes means the
/// server went away mid-conversation.
pub async fn read_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<String, Error> {
    let mut line = String::new();
    let bytes_read = reader.read_line(&mut line).await.map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Error::ConnectionClosed
        } else {
            Error::Io(e)
        }
    })?;

    if bytes_read == 0 {
        return Err(Error::ConnectionClosed);
    }

    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }

    Ok(line)
}
