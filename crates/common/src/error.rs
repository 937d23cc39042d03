/// Erros de framing/decodificação do protocolo de linhas.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("linha incompleta")]
    Incomplete,
    #[error("linha excede tamanho máximo ({0} bytes)")]
    LineTooLong(usize),
    #[error("encoding inválido: {0}")]
    InvalidEncoding(String),
    #[error("resposta inesperada: {0}")]
    UnexpectedResponse(String),
}

/// Erros de execução contra o store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("lock do store envenenado por pânico anterior")]
    LockPoisoned,
}

/// Erros de conexão TCP.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("conexão resetada pelo peer")]
    ConnectionReset,
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Erros de roteamento no anel, levantados antes de qualquer I/O.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoutingError {
    #[error("nenhum nó de cache conectado")]
    NoNodesConnected,
    #[error("nenhum nó responsável pela posição {0}")]
    NoOwner(u32),
}

/// Erros vistos pelo chamador do cliente distribuído.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Routing(#[from] RoutingError),
    #[error("falha ao conectar em {addr} após {attempts} tentativas: {source}")]
    Connect {
        addr: String,
        attempts: u32,
        #[source]
        source: std::io::Error,
    },
    #[error("resposta inesperada no handshake com {addr}: {response}")]
    Handshake { addr: String, response: String },
    #[error("erro na conexão com {addr}: {source}")]
    Connection {
        addr: String,
        #[source]
        source: ConnectionError,
    },
    #[error("conexão com {0} encerrada")]
    Closed(String),
    #[error("timeout esperando resposta de {0}")]
    Timeout(String),
    #[error("servidor respondeu erro: {0}")]
    Server(String),
    #[error("resposta inesperada: {0}")]
    UnexpectedResponse(String),
    #[error("chave inválida: {0:?}")]
    InvalidKey(String),
    #[error("valor inválido: {0}")]
    InvalidValue(String),
}

/// Result type alias.
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_error_display() {
        let err = ProtocolError::Incomplete;
        assert_eq!(err.to_string(), "linha incompleta");
    }

    #[test]
    fn routing_error_display() {
        let err = RoutingError::NoNodesConnected;
        assert_eq!(err.to_string(), "nenhum nó de cache conectado");
    }

    #[test]
    fn client_error_from_routing() {
        let err: ClientError = RoutingError::NoOwner(7).into();
        assert!(matches!(
            err,
            ClientError::Routing(RoutingError::NoOwner(7))
        ));
    }

    #[test]
    fn connection_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "broken");
        let err: ConnectionError = io_err.into();
        assert!(matches!(err, ConnectionError::Io(_)));
    }

    #[test]
    fn connection_error_from_protocol() {
        let err: ConnectionError = ProtocolError::LineTooLong(10).into();
        assert_eq!(err.to_string(), "linha excede tamanho máximo (10 bytes)");
    }
}
