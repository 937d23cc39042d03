use memvault_common::ProtocolError;

/// Respostas possíveis de um nó.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Ok,
    OkWithValue(String),
    NotFound,
    Pong,
    Error(String),
}

impl Response {
    /// Renderiza a resposta como linha de protocolo (sem terminador).
    pub fn to_line(&self) -> String {
        match self {
            Response::Ok => "OK".to_string(),
            Response::OkWithValue(value) => format!("OK {value}"),
            Response::NotFound => "NOT_FOUND".to_string(),
            Response::Pong => "PONG".to_string(),
            Response::Error(message) => format!("ERROR {message}"),
        }
    }

    /// Faz o parse de uma linha de resposta recebida pelo cliente.
    pub fn parse(line: &str) -> Result<Response, ProtocolError> {
        match line {
            "OK" => Ok(Response::Ok),
            "NOT_FOUND" => Ok(Response::NotFound),
            "PONG" => Ok(Response::Pong),
            _ => {
                if let Some(value) = line.strip_prefix("OK ") {
                    Ok(Response::OkWithValue(value.to_string()))
                } else if let Some(message) = line.strip_prefix("ERROR ") {
                    Ok(Response::Error(message.to_string()))
                } else {
                    Err(ProtocolError::UnexpectedResponse(line.to_string()))
                }
            }
        }
    }
}
