//! Recursive-descent evaluator for arithmetic and dataframe expressions.
//!
//! Arithmetic: `+`, `-`, `*`, `/`, parentheses, unary negation, decimals.
//! When a table is bound to `df`, also: `df.head()`, `df.head(n)`,
//! `df.shape`, `df.columns`, `len(df)`, `df['col']`, and the column
//! aggregates `sum() mean() min() max() count() unique()`.

use crate::table::{Cell, Table};

/// The result of evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    /// The bound table itself.
    Frame,
    /// A column of the bound table, by index.
    Column(usize),
    /// A rendered preview of the first rows.
    Preview(String),
    Shape(usize, usize),
    List(Vec<String>),
}

impl Value {
    /// Render the value the way an interactive session would echo it.
    pub fn render(&self, table: Option<&Table>) -> String {
        match self {
            Value::Number(n) => format_number(*n),
            Value::Text(s) => s.clone(),
            Value::Frame => table.map(|t| t.head(t.len())).unwrap_or_default(),
            Value::Column(idx) => table.map(|t| t.render_column(*idx)).unwrap_or_default(),
            Value::Preview(s) => s.clone(),
            Value::Shape(rows, cols) => format!("({rows}, {cols})"),
            Value::List(items) => {
                let quoted: Vec<String> = items.iter().map(|i| format!("'{i}'")).collect();
                format!("[{}]", quoted.join(", "))
            }
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Text(_) => "str",
            Value::Frame => "DataFrame",
            Value::Column(_) => "Series",
            Value::Preview(_) => "DataFrame",
            Value::Shape(..) => "tuple",
            Value::List(_) => "list",
        }
    }
}

/// Integers print without a trailing `.0`.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Evaluate a purely arithmetic expression.
pub fn evaluate(expr: &str) -> Result<f64, String> {
    match evaluate_with(expr, None)? {
        Value::Number(n) => Ok(n),
        other => Err(format!("Expected a number, got {}", other.kind())),
    }
}

/// Evaluate an expression with an optional table bound to `df`.
pub fn evaluate_with(expr: &str, table: Option<&Table>) -> Result<Value, String> {
    let tokens = tokenize(expr)?;
    let mut parser = Parser::new(&tokens, table);
    let result = parser.parse_expr()?;
    if parser.pos < parser.tokens.len() {
        return Err(format!(
            "Unexpected token at position {}: {:?}",
            parser.pos, parser.tokens[parser.pos]
        ));
    }
    Ok(result)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Dot,
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            c if c.is_whitespace() => i += 1,
            '+' => { tokens.push(Token::Plus); i += 1; }
            '-' => { tokens.push(Token::Minus); i += 1; }
            '*' => { tokens.push(Token::Star); i += 1; }
            '/' => { tokens.push(Token::Slash); i += 1; }
            '(' => { tokens.push(Token::LParen); i += 1; }
            ')' => { tokens.push(Token::RParen); i += 1; }
            '[' => { tokens.push(Token::LBracket); i += 1; }
            ']' => { tokens.push(Token::RBracket); i += 1; }
            '.' if !chars.get(i + 1).is_some_and(|c| c.is_ascii_digit()) => {
                tokens.push(Token::Dot);
                i += 1;
            }
            quote @ ('\'' | '"') => {
                let start = i + 1;
                let end = chars[start..]
                    .iter()
                    .position(|&c| c == quote)
                    .map(|p| start + p)
                    .ok_or("Unterminated string literal")?;
                tokens.push(Token::Str(chars[start..end].iter().collect()));
                i = end + 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let num_str: String = chars[start..i].iter().collect();
                let num: f64 = num_str
                    .parse()
                    .map_err(|_| format!("Invalid number: {num_str}"))?;
                tokens.push(Token::Number(num));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            c => return Err(format!("Unexpected character: '{c}'")),
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    table: Option<&'a Table>,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token], table: Option<&'a Table>) -> Self {
        Self { tokens, pos: 0, table }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn consume(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<(), String> {
        match self.consume() {
            Some(tok) if *tok == expected => Ok(()),
            _ => Err(format!("Expected {what}")),
        }
    }

    fn table(&self) -> Result<&'a Table, String> {
        self.table.ok_or_else(|| "name 'df' is not defined".to_string())
    }

    // expr = term (('+' | '-') term)*
    fn parse_expr(&mut self) -> Result<Value, String> {
        let mut left = self.parse_term()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Plus => {
                    self.consume();
                    let right = self.parse_term()?;
                    left = Value::Number(number(&left)? + number(&right)?);
                }
                Token::Minus => {
                    self.consume();
                    let right = self.parse_term()?;
                    left = Value::Number(number(&left)? - number(&right)?);
                }
                _ => break,
            }
        }
        Ok(left)
    }

    // term = unary (('*' | '/') unary)*
    fn parse_term(&mut self) -> Result<Value, String> {
        let mut left = self.parse_unary()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Star => {
                    self.consume();
                    let right = self.parse_unary()?;
                    left = Value::Number(number(&left)? * number(&right)?);
                }
                Token::Slash => {
                    self.consume();
                    let right = number(&self.parse_unary()?)?;
                    if right == 0.0 {
                        return Err("Division by zero".into());
                    }
                    left = Value::Number(number(&left)? / right);
                }
                _ => break,
            }
        }
        Ok(left)
    }

    // unary = '-' unary | postfix
    fn parse_unary(&mut self) -> Result<Value, String> {
        if let Some(Token::Minus) = self.peek() {
            self.consume();
            let val = number(&self.parse_unary()?)?;
            return Ok(Value::Number(-val));
        }
        self.parse_postfix()
    }

    // postfix = primary ('.' IDENT ['(' [expr] ')'] | '[' STRING ']')*
    fn parse_postfix(&mut self) -> Result<Value, String> {
        let mut value = self.parse_primary()?;
        loop {
            match self.peek() {
                Some(Token::Dot) => {
                    self.consume();
                    let name = match self.consume() {
                        Some(Token::Ident(name)) => name.clone(),
                        _ => return Err("Expected attribute name after '.'".into()),
                    };
                    let arg = if let Some(Token::LParen) = self.peek() {
                        self.consume();
                        let arg = if let Some(Token::RParen) = self.peek() {
                            None
                        } else {
                            Some(self.parse_expr()?)
                        };
                        self.expect(Token::RParen, "closing parenthesis")?;
                        Some(arg)
                    } else {
                        None
                    };
                    value = self.apply_member(value, &name, arg)?;
                }
                Some(Token::LBracket) => {
                    self.consume();
                    let key = match self.consume() {
                        Some(Token::Str(key)) => key.clone(),
                        _ => return Err("Expected a quoted column name".into()),
                    };
                    self.expect(Token::RBracket, "closing bracket")?;
                    value = self.index(value, &key)?;
                }
                _ => return Ok(value),
            }
        }
    }

    // primary = NUMBER | STRING | 'df' | 'len' '(' expr ')' | '(' expr ')'
    fn parse_primary(&mut self) -> Result<Value, String> {
        match self.consume().cloned() {
            Some(Token::Number(n)) => Ok(Value::Number(n)),
            Some(Token::Str(s)) => Ok(Value::Text(s)),
            Some(Token::Ident(name)) if name == "df" => {
                self.table()?;
                Ok(Value::Frame)
            }
            Some(Token::Ident(name)) if name == "len" => {
                self.expect(Token::LParen, "'(' after len")?;
                let arg = self.parse_expr()?;
                self.expect(Token::RParen, "closing parenthesis")?;
                self.length(&arg)
            }
            Some(Token::Ident(name)) => Err(format!("name '{name}' is not defined")),
            Some(Token::LParen) => {
                let val = self.parse_expr()?;
                self.expect(Token::RParen, "closing parenthesis")?;
                Ok(val)
            }
            Some(tok) => Err(format!("Unexpected token: {tok:?}")),
            None => Err("Unexpected end of expression".into()),
        }
    }

    fn length(&self, value: &Value) -> Result<Value, String> {
        let n = match value {
            Value::Frame | Value::Column(_) => self.table()?.len(),
            Value::List(items) => items.len(),
            Value::Text(s) => s.chars().count(),
            other => return Err(format!("object of type '{}' has no len()", other.kind())),
        };
        Ok(Value::Number(n as f64))
    }

    fn index(&self, value: Value, key: &str) -> Result<Value, String> {
        match value {
            Value::Frame => {
                let table = self.table()?;
                table
                    .column_index(key)
                    .map(Value::Column)
                    .ok_or_else(|| format!("KeyError: '{key}'"))
            }
            other => Err(format!("'{}' object is not subscriptable", other.kind())),
        }
    }

    fn apply_member(
        &self,
        value: Value,
        name: &str,
        arg: Option<Option<Value>>,
    ) -> Result<Value, String> {
        let no_attribute = |value: &Value| {
            format!("'{}' object has no attribute '{name}'", value.kind())
        };
        let Some(table) = self.table else {
            return Err(no_attribute(&value));
        };
        match (&value, name, arg) {
            (Value::Frame, "shape", None) => Ok(Value::Shape(table.len(), table.columns().len())),
            (Value::Frame, "columns", None) => Ok(Value::List(table.columns().to_vec())),
            (Value::Frame, "head", Some(n)) => {
                let n = match n {
                    Some(v) => count(&v)?,
                    None => 5,
                };
                Ok(Value::Preview(table.head(n)))
            }
            (Value::Frame, column, None) => table
                .column_index(column)
                .map(Value::Column)
                .ok_or_else(|| no_attribute(&value)),
            (Value::Column(idx), agg, Some(None)) => aggregate(table, *idx, agg),
            _ => Err(no_attribute(&value)),
        }
    }
}

fn number(value: &Value) -> Result<f64, String> {
    match value {
        Value::Number(n) => Ok(*n),
        other => Err(format!(
            "unsupported operand type for arithmetic: '{}'",
            other.kind()
        )),
    }
}

fn count(value: &Value) -> Result<usize, String> {
    let n = number(value)?;
    if n < 0.0 || n.fract() != 0.0 {
        return Err(format!("expected a non-negative integer, got {}", format_number(n)));
    }
    Ok(n as usize)
}

fn aggregate(table: &Table, idx: usize, name: &str) -> Result<Value, String> {
    let cells: Vec<&Cell> = table.column_cells(idx).filter(|c| !c.is_null()).collect();
    let column = &table.columns()[idx];

    let numbers = || -> Result<Vec<f64>, String> {
        cells
            .iter()
            .map(|c| c.as_f64().ok_or_else(|| format!("column '{column}' is not numeric")))
            .collect()
    };

    match name {
        "count" => Ok(Value::Number(cells.len() as f64)),
        "sum" => Ok(Value::Number(numbers()?.iter().sum())),
        "mean" => {
            let nums = numbers()?;
            if nums.is_empty() {
                return Err(format!("column '{column}' has no values"));
            }
            Ok(Value::Number(nums.iter().sum::<f64>() / nums.len() as f64))
        }
        "min" | "max" => {
            if cells.is_empty() {
                return Err(format!("column '{column}' has no values"));
            }
            if let Ok(nums) = numbers() {
                let folded = nums.into_iter().reduce(|a, b| {
                    if (name == "min") == (b < a) { b } else { a }
                });
                return folded
                    .map(Value::Number)
                    .ok_or_else(|| format!("column '{column}' has no values"));
            }
            let texts = cells.iter().map(|c| c.to_string());
            let folded = if name == "min" { texts.min() } else { texts.max() };
            folded
                .map(Value::Text)
                .ok_or_else(|| format!("column '{column}' has no values"))
        }
        "unique" => {
            let mut seen: Vec<String> = Vec::new();
            for cell in &cells {
                let text = cell.to_string();
                if !seen.contains(&text) {
                    seen.push(text);
                }
            }
            Ok(Value::List(seen))
        }
        other => Err(format!("'Series' object has no attribute '{other}'")),
    }
}
