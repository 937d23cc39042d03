use memvault_common::{DEFAULT_TTL_SECS, MIN_TTL_SECS};

use crate::{Parse, RawValue, Value};

/// Enum com todos os comandos suportados.
///
/// ```text
/// GET <key>
/// DEL <key>
/// PING
/// SET <key> <value> [EX <ttlSeconds>]
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Get(String),
    Set {
        key: String,
        value: Value,
        ttl_secs: u64,
    },
    Delete(String),
    Ping,
    /// Qualquer entrada fora da gramática, preservada como chegou.
    Unknown(String),
}

impl Command {
    /// Faz o parse de uma linha (sem terminador) em um Command.
    ///
    /// Nunca falha: o que não casa com a gramática vira `Unknown`.
    pub fn parse(line: &str) -> Command {
        parse_known(line).unwrap_or_else(|| Command::Unknown(line.to_string()))
    }

    /// Renderiza o comando como linha de protocolo (sem terminador).
    pub fn to_line(&self) -> String {
        match self {
            Command::Get(key) => format!("GET {key}"),
            Command::Set {
                key,
                value,
                ttl_secs,
            } => format!("SET {key} {} EX {ttl_secs}", value.to_token()),
            Command::Delete(key) => format!("DEL {key}"),
            Command::Ping => "PING".to_string(),
            Command::Unknown(original) => original.clone(),
        }
    }

    /// Nome do comando, para logs.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Get(_) => "GET",
            Command::Set { .. } => "SET",
            Command::Delete(_) => "DEL",
            Command::Ping => "PING",
            Command::Unknown(_) => "UNKNOWN",
        }
    }
}

/// Uma chave válida é um único token que não começa com aspas.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && !key.starts_with('"') && !key.contains(char::is_whitespace)
}

fn parse_known(line: &str) -> Option<Command> {
    let mut parse = Parse::new(line);
    let cmd_name = parse.next_word()?.to_ascii_uppercase();

    let cmd = match cmd_name.as_str() {
        "PING" => Command::Ping,
        "GET" => Command::Get(parse_key(&mut parse)?),
        "DEL" => Command::Delete(parse_key(&mut parse)?),
        "SET" => parse_set(&mut parse)?,
        _ => return None,
    };

    parse.is_finished().then_some(cmd)
}

fn parse_key(parse: &mut Parse<'_>) -> Option<String> {
    let key = parse.next_word()?;
    is_valid_key(key).then(|| key.to_string())
}

fn parse_set(parse: &mut Parse<'_>) -> Option<Command> {
    let key = parse_key(parse)?;
    let value = match parse.next_value()? {
        RawValue::Quoted(raw) => Value::Text(raw.to_string()),
        RawValue::Bare(token) => Value::coerce(token),
    };

    let mut ttl_secs = DEFAULT_TTL_SECS;
    if !parse.is_finished() {
        if !parse.next_word()?.eq_ignore_ascii_case("EX") {
            return None;
        }
        let ttl = parse.next_word()?;
        if ttl.is_empty() || !ttl.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        // Só dígitos: a única falha possível é overflow, que satura.
        ttl_secs = ttl.parse::<u64>().unwrap_or(u64::MAX);
    }

    Some(Command::Set {
        key,
        value,
        ttl_secs: ttl_secs.max(MIN_TTL_SECS),
    })
}
