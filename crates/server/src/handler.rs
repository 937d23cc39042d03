use tokio::sync::broadcast;
use tokio::time::Duration;
use tracing::{debug, warn};

use memvault_common::{ConnectionError, ProtocolError};
use memvault_protocol::{Command, Connection, Response};
use memvault_storage::Db;

/// Loop principal de tratamento de uma conexão.
///
/// Cada linha recebida produz no máximo uma resposta, na ordem de chegada.
/// Comandos desconhecidos são apenas logados e não recebem resposta.
pub async fn handle_connection(
    mut conn: Connection,
    db: Db,
    shutdown: &mut broadcast::Receiver<()>,
) -> Result<(), ConnectionError> {
    loop {
        let line = tokio::select! {
            result = conn.read_line() => result,
            _ = shutdown.recv() => {
                return Ok(());
            }
        };

        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => return Ok(()), // EOF
            Err(ConnectionError::Protocol(ProtocolError::InvalidEncoding(e))) => {
                warn!("linha descartada: {e}");
                continue;
            }
            Err(e) => return Err(e),
        };

        let cmd = Command::parse(&line);
        debug!(command = cmd.name(), "comando recebido: {cmd:?}");

        if let Some(response) = execute_command(cmd, &db) {
            conn.write_line(&response.to_line()).await?;
        }
    }
}

/// Executa um comando contra o store. `None` quando não há resposta a enviar.
pub fn execute_command(cmd: Command, db: &Db) -> Option<Response> {
    let response = match cmd {
        Command::Ping => Response::Pong,
        Command::Get(key) => match db.get(&key) {
            Ok(Some(value)) => Response::OkWithValue(value),
            Ok(None) => Response::NotFound,
            Err(e) => Response::Error(e.to_string()),
        },
        Command::Set {
            key,
            value,
            ttl_secs,
        } => match db.set(key, value.to_wire(), Some(Duration::from_secs(ttl_secs))) {
            Ok(()) => Response::Ok,
            Err(e) => Response::Error(e.to_string()),
        },
        Command::Delete(key) => match db.delete(&key) {
            Ok(_) => Response::Ok,
            Err(e) => Response::Error(e.to_string()),
        },
        Command::Unknown(line) => {
            warn!("comando desconhecido ignorado: {line:?}");
            return None;
        }
    };
    Some(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use memvault_common::StorageError;
    use std::num::NonZeroUsize;

    fn db(capacity: usize) -> Db {
        Db::new(NonZeroUsize::new(capacity).unwrap())
    }

    fn run(db: &Db, line: &str) -> Option<Response> {
        execute_command(Command::parse(line), db)
    }

    #[test]
    fn ping_answers_pong() {
        assert_eq!(run(&db(2), "PING"), Some(Response::Pong));
    }

    #[test]
    fn set_then_get() {
        let db = db(2);
        assert_eq!(run(&db, "SET a 1"), Some(Response::Ok));
        assert_eq!(run(&db, "GET a"), Some(Response::OkWithValue("1".into())));
    }

    #[test]
    fn get_missing_is_not_found() {
        assert_eq!(run(&db(2), "GET nope"), Some(Response::NotFound));
    }

    #[test]
    fn delete_is_idempotent() {
        let db = db(2);
        run(&db, "SET a 1");
        assert_eq!(run(&db, "DEL a"), Some(Response::Ok));
        assert_eq!(run(&db, "DEL a"), Some(Response::Ok));
        assert_eq!(db.len().unwrap(), 0);
    }

    #[test]
    fn quoted_value_is_stored_as_text() {
        let db = db(2);
        run(&db, r#"SET k "42""#);
        assert_eq!(db.get("k").unwrap(), Some("42".into()));
        run(&db, r#"SET k "hello world" EX 60"#);
        assert_eq!(db.get("k").unwrap(), Some("hello world".into()));
    }

    #[test]
    fn json_value_is_stored_compact() {
        let db = db(2);
        run(&db, r#"SET u {"id":1,"tags":["a"]}"#);
        assert_eq!(db.get("u").unwrap(), Some(r#"{"id":1,"tags":["a"]}"#.into()));
    }

    #[test]
    fn unknown_gets_no_response() {
        let db = db(2);
        for line in ["", "   ", "FLUSHALL", "GET", "SET k"] {
            assert_eq!(run(&db, line), None, "line: {line:?}");
        }
    }

    #[test]
    fn capacity_two_evicts_least_recent() {
        let db = db(2);
        run(&db, "SET a 1");
        run(&db, "SET b 2");
        run(&db, "SET c 3");
        assert_eq!(run(&db, "GET a"), Some(Response::NotFound));
        assert_eq!(run(&db, "GET b"), Some(Response::OkWithValue("2".into())));
        assert_eq!(run(&db, "GET c"), Some(Response::OkWithValue("3".into())));
    }

    #[test]
    fn store_failure_becomes_error_response() {
        let db = db(2);
        let handle = db.clone();
        let _ = std::thread::spawn(move || {
            let _: Result<(), StorageError> = handle.with_store(|_| panic!("store quebrado"));
        })
        .join();

        let expected = Some(Response::Error(StorageError::LockPoisoned.to_string()));
        for line in ["GET a", "SET a 1", "DEL a"] {
            assert_eq!(run(&db, line), expected, "line: {line:?}");
        }
        // PING não depende do store.
        assert_eq!(run(&db, "PING"), Some(Response::Pong));
        assert_eq!(
            run(&db, "GET a").map(|r| r.to_line()),
            Some(format!("ERROR {}", StorageError::LockPoisoned))
        );
    }

    #[test]
    fn oversized_ttl_is_accepted() {
        let db = db(2);
        assert_eq!(
            run(&db, "SET a 1 EX 99999999999999999999"),
            Some(Response::Ok)
        );
        assert_eq!(run(&db, "GET a"), Some(Response::OkWithValue("1".into())));
    }

    #[tokio::test(start_paused = true)]
    async fn ttl_expires_entry() {
        let db = db(2);
        run(&db, "SET a 1 EX 1");
        assert_eq!(run(&db, "GET a"), Some(Response::OkWithValue("1".into())));
        tokio::time::advance(Duration::from_millis(1_001)).await;
        assert_eq!(run(&db, "GET a"), Some(Response::NotFound));
    }
}
