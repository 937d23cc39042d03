use std::fmt;

/// Valor de um SET após a regra de coerção compartilhada.
///
/// Tokens sem aspas tentam, nesta ordem: inteiro, ponto flutuante, booleano
/// literal e objeto/array JSON. Valores entre aspas são sempre `Text`, com os
/// escapes mantidos sem decodificar.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Bool(bool),
    Json(serde_json::Value),
    Text(String),
}

impl Value {
    /// Aplica a regra de coerção a um token sem aspas.
    pub fn coerce(token: &str) -> Value {
        if let Ok(n) = token.parse::<i64>() {
            return Value::Integer(n);
        }
        if is_float_literal(token)
            && let Ok(f) = token.parse::<f64>()
            && f.is_finite()
        {
            return Value::Float(f);
        }
        match token {
            "true" => return Value::Bool(true),
            "false" => return Value::Bool(false),
            _ => {}
        }
        if is_json_container(token)
            && let Ok(json) = serde_json::from_str::<serde_json::Value>(token)
        {
            return Value::Json(json);
        }
        Value::Text(token.to_string())
    }

    /// Forma armazenada pelo nó e devolvida em `OK <valor>`.
    ///
    /// Valores coagidos saem na forma canônica, não no texto recebido:
    /// `1e3` sai como `1000.0` e `007` sai como `7`. Um inteiro fora de `i64`
    /// vira float (`12345678901234567890` sai como `1.2345678901234567e19`).
    /// Para guardar o texto exato, envie o valor entre aspas.
    pub fn to_wire(&self) -> String {
        match self {
            Value::Integer(n) => n.to_string(),
            Value::Float(f) => format!("{f:?}"),
            Value::Bool(b) => b.to_string(),
            Value::Json(json) => json.to_string(),
            Value::Text(s) => s.clone(),
        }
    }

    /// Forma usada ao renderizar um SET: texto que não sobreviveria como
    /// token sem aspas volta entre aspas.
    pub(crate) fn to_token(&self) -> String {
        match self {
            Value::Text(s) if needs_quotes(s) => format!("\"{s}\""),
            other => other.to_wire(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire())
    }
}

/// Escapa `\` e `"` para envio entre aspas.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c == '\\' || c == '"' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Desfaz `escape`: `\"` vira `"` e `\\` vira `\`. Outras sequências ficam como estão.
pub fn unescape(wire: &str) -> String {
    let mut out = String::with_capacity(wire.len());
    let mut chars = wire.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\'
            && let Some(&next) = chars.peek()
            && (next == '"' || next == '\\')
        {
            out.push(next);
            chars.next();
            continue;
        }
        out.push(c);
    }
    out
}

fn is_float_literal(token: &str) -> bool {
    token.bytes().any(|b| b.is_ascii_digit())
        && token
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'-' | b'+' | b'.' | b'e' | b'E'))
}

fn is_json_container(token: &str) -> bool {
    (token.starts_with('{') && token.ends_with('}'))
        || (token.starts_with('[') && token.ends_with(']'))
}

fn needs_quotes(s: &str) -> bool {
    s.is_empty()
        || s.starts_with('"')
        || s.contains(char::is_whitespace)
        || !matches!(Value::coerce(s), Value::Text(_))
}
