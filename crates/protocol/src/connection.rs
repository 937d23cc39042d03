use bytes::{Buf, BytesMut};
use std::io::Cursor;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;

use memvault_common::{ConnectionError, INITIAL_BUFFER_CAPACITY};

use crate::line;

/// Wrapper sobre TcpStream com buffer para leitura/escrita de linhas.
///
/// `read_line` é cancel-safe: bytes parciais ficam no buffer interno, então
/// pode ser usado dentro de `tokio::select!`.
pub struct Connection {
    stream: BufWriter<TcpStream>,
    buffer: BytesMut,
    /// Bytes do buffer já examinados sem encontrar `\n`.
    scanned: usize,
}

impl Connection {
    pub fn new(stream: TcpStream) -> Self {
        Self {
            stream: BufWriter::new(stream),
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            scanned: 0,
        }
    }

    /// Lê uma linha completa do stream. Retorna None no EOF.
    pub async fn read_line(&mut self) -> Result<Option<String>, ConnectionError> {
        loop {
            if let Some(line) = self.parse_line()? {
                return Ok(Some(line));
            }

            let n = self.stream.read_buf(&mut self.buffer).await?;
            if n == 0 {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                return Err(ConnectionError::ConnectionReset);
            }
        }
    }

    /// Escreve uma linha no stream, terminada em CRLF.
    pub async fn write_line(&mut self, text: &str) -> Result<(), ConnectionError> {
        let mut buf = BytesMut::new();
        line::encode(text, &mut buf);
        self.stream.write_all(&buf).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Uma linha com UTF-8 inválido é consumida do buffer antes do erro ser
    /// devolvido, então a conexão continua utilizável.
    fn parse_line(&mut self) -> Result<Option<String>, ConnectionError> {
        let Some(len) = line::find_line(&self.buffer, &mut self.scanned)? else {
            return Ok(None);
        };

        let mut cursor = Cursor::new(&self.buffer[..len]);
        let parsed = line::parse(&mut cursor);
        self.buffer.advance(len);
        Ok(Some(parsed?))
    }
}
