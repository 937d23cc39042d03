//! Framing de linhas terminadas em CRLF.
//!
//! O servidor também aceita LF puro na entrada; a saída é sempre CRLF.

use bytes::{Buf, BufMut, BytesMut};
use std::io::Cursor;

use memvault_common::{MAX_LINE_LENGTH, ProtocolError};

/// Verifica se uma linha completa está disponível no buffer sem alocar.
/// Em caso de sucesso o cursor fica posicionado logo após o `\n`.
pub fn check(src: &mut Cursor<&[u8]>) -> Result<(), ProtocolError> {
    let start = src.position() as usize;
    let buf = *src.get_ref();

    match buf[start..].iter().position(|&b| b == b'\n') {
        Some(offset) => {
            if offset > MAX_LINE_LENGTH {
                return Err(ProtocolError::LineTooLong(offset));
            }
            src.set_position((start + offset + 1) as u64);
            Ok(())
        }
        None if src.remaining() > MAX_LINE_LENGTH => {
            Err(ProtocolError::LineTooLong(src.remaining()))
        }
        None => Err(ProtocolError::Incomplete),
    }
}

/// Procura o fim da próxima linha retomando de `*scanned`, o número de bytes
/// já examinados sem achar `\n`. Assim uma linha longa que chega aos pedaços
/// é varrida uma única vez. Retorna o tamanho da linha com o terminador.
pub fn find_line(buf: &[u8], scanned: &mut usize) -> Result<Option<usize>, ProtocolError> {
    let from = (*scanned).min(buf.len());
    match buf[from..].iter().position(|&b| b == b'\n') {
        Some(offset) => {
            let end = from + offset;
            if end > MAX_LINE_LENGTH {
                return Err(ProtocolError::LineTooLong(end));
            }
            *scanned = 0;
            Ok(Some(end + 1))
        }
        None if buf.len() > MAX_LINE_LENGTH => Err(ProtocolError::LineTooLong(buf.len())),
        None => {
            *scanned = buf.len();
            Ok(None)
        }
    }
}

/// Faz o parse de uma linha completa, sem o terminador.
/// Deve ser chamado apenas após `check()` retornar Ok.
pub fn parse(src: &mut Cursor<&[u8]>) -> Result<String, ProtocolError> {
    let start = src.position() as usize;
    check(src)?;
    let end = src.position() as usize - 1; // posição do \n

    let buf = *src.get_ref();
    let mut line = &buf[start..end];
    if let Some(stripped) = line.strip_suffix(b"\r") {
        line = stripped;
    }

    String::from_utf8(line.to_vec()).map_err(|e| ProtocolError::InvalidEncoding(e.to_string()))
}

/// Encoda uma linha no buffer de saída, terminada em CRLF.
pub fn encode(line: &str, dst: &mut BytesMut) {
    dst.reserve(line.len() + 2);
    dst.put(line.as_bytes());
    dst.put(&b"\r\n"[..]);
}
