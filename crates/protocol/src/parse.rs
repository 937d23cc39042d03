/// Valor bruto de um SET, antes da coerção.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawValue<'a> {
    /// Conteúdo entre aspas, com escapes preservados.
    Quoted(&'a str),
    /// Token sem aspas.
    Bare(&'a str),
}

/// Cursor sobre uma linha de comando para extrair tokens sequencialmente.
pub struct Parse<'a> {
    line: &'a str,
    pos: usize,
}

impl<'a> Parse<'a> {
    pub fn new(line: &'a str) -> Parse<'a> {
        Parse { line, pos: 0 }
    }

    /// Retorna a próxima palavra (sequência de caracteres não-brancos).
    pub fn next_word(&mut self) -> Option<&'a str> {
        self.skip_whitespace();
        let rest = self.rest();
        if rest.is_empty() {
            return None;
        }
        let len = rest.find(char::is_whitespace).unwrap_or(rest.len());
        self.pos += len;
        Some(&rest[..len])
    }

    /// Retorna o próximo valor, entre aspas ou não.
    ///
    /// Um valor entre aspas precisa fechar e ser seguido de espaço ou fim da
    /// linha; `\` escapa o caractere seguinte, que é mantido como está.
    pub fn next_value(&mut self) -> Option<RawValue<'a>> {
        self.skip_whitespace();
        let rest = self.rest();
        if !rest.starts_with('"') {
            return self.next_word().map(RawValue::Bare);
        }

        let mut chars = rest.char_indices().skip(1);
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => {
                    chars.next()?;
                }
                '"' => {
                    let after = &rest[i + 1..];
                    if !after.is_empty() && !after.starts_with(char::is_whitespace) {
                        return None;
                    }
                    self.pos += i + 1;
                    return Some(RawValue::Quoted(&rest[1..i]));
                }
                _ => {}
            }
        }

        None
    }

    /// Verifica se só resta espaço em branco.
    pub fn is_finished(&self) -> bool {
        self.rest().trim_start().is_empty()
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn rest(&self) -> &'a str {
        &self.line[self.pos..]
    }
}
