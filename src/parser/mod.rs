//! Parser for `.hal` interface files.
//!
//! Hand-rolled scanner plus recursive descent over the declaration grammar:
//! a `package` header, `import` lines, named type declarations (`enum`,
//! `struct`, `union`, `typedef`, optionally `@export`-annotated), and at
//! most one `interface` block with methods. The parser records everything
//! the coordinator and the emitters query; it does not evaluate enum
//! initializer expressions, it carries them as text.

use std::path::Path;

use anyhow::Result;
use thiserror::Error;

use crate::core::ast::{Ast, EnumValue, Field, Interface, Method, NamedType, Scope, TypeDetail};
use crate::core::fqname::{FQName, IBASE};
use crate::util::fs;

/// Syntax or structure error in a `.hal` file.
#[derive(Debug, Error)]
#[error("{path}:{line}: {message}")]
pub struct ParseError {
    pub path: String,
    pub line: usize,
    pub message: String,
}

/// Types that cannot be expressed in the Java backend.
const JAVA_INCOMPATIBLE_TYPES: &[&str] = &["pointer", "memory", "fmq_sync", "fmq_unsync"];

/// Parse the `.hal` file at `path`.
pub fn parse_file(path: &Path) -> Result<Ast> {
    let source = fs::read_to_string(path)?;
    let ast = parse_source(&source, path)?;
    Ok(ast)
}

/// Parse `.hal` source text, reporting errors against `path`.
pub fn parse_source(source: &str, path: &Path) -> Result<Ast, ParseError> {
    let path = path.display().to_string();
    let tokens = tokenize(source, &path)?;
    let parser = Parser {
        path,
        tokens,
        pos: 0,
        package: None,
        java_compatible: true,
    };
    parser.parse()
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Number(String),
    Punct(&'static str),
}

impl Token {
    fn text(&self) -> &str {
        match self {
            Token::Ident(s) | Token::Number(s) => s,
            Token::Punct(p) => p,
        }
    }
}

fn tokenize(source: &str, path: &str) -> Result<Vec<(Token, usize)>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();
    let mut line = 1;

    while let Some((i, c)) = chars.next() {
        match c {
            '\n' => line += 1,
            c if c.is_whitespace() => {}
            '/' if matches!(chars.peek(), Some((_, '/'))) => {
                for (_, c) in chars.by_ref() {
                    if c == '\n' {
                        line += 1;
                        break;
                    }
                }
            }
            '/' if matches!(chars.peek(), Some((_, '*'))) => {
                chars.next();
                let mut closed = false;
                while let Some((_, c)) = chars.next() {
                    if c == '\n' {
                        line += 1;
                    } else if c == '*' && matches!(chars.peek(), Some((_, '/'))) {
                        chars.next();
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    return Err(ParseError {
                        path: path.to_string(),
                        line,
                        message: "unterminated comment".to_string(),
                    });
                }
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut end = i + c.len_utf8();
                while let Some(&(j, c)) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        chars.next();
                        end = j + c.len_utf8();
                    } else {
                        break;
                    }
                }
                tokens.push((Token::Ident(source[i..end].to_string()), line));
            }
            c if c.is_ascii_digit() => {
                let mut end = i + c.len_utf8();
                while let Some(&(j, c)) = chars.peek() {
                    if c.is_ascii_alphanumeric() {
                        chars.next();
                        end = j + c.len_utf8();
                    } else {
                        break;
                    }
                }
                tokens.push((Token::Number(source[i..end].to_string()), line));
            }
            ':' if matches!(chars.peek(), Some((_, ':'))) => {
                chars.next();
                tokens.push((Token::Punct("::"), line));
            }
            '<' if matches!(chars.peek(), Some((_, '<'))) => {
                chars.next();
                tokens.push((Token::Punct("<<"), line));
            }
            '>' if matches!(chars.peek(), Some((_, '>'))) => {
                chars.next();
                tokens.push((Token::Punct(">>"), line));
            }
            _ => {
                let punct = match c {
                    '@' => "@",
                    '.' => ".",
                    ';' => ";",
                    ':' => ":",
                    ',' => ",",
                    '=' => "=",
                    '{' => "{",
                    '}' => "}",
                    '(' => "(",
                    ')' => ")",
                    '<' => "<",
                    '>' => ">",
                    '[' => "[",
                    ']' => "]",
                    '|' => "|",
                    '&' => "&",
                    '+' => "+",
                    '-' => "-",
                    '*' => "*",
                    '/' => "/",
                    _ => {
                        return Err(ParseError {
                            path: path.to_string(),
                            line,
                            message: format!("unexpected character `{c}`"),
                        })
                    }
                };
                tokens.push((Token::Punct(punct), line));
            }
        }
    }

    Ok(tokens)
}

struct Parser {
    path: String,
    tokens: Vec<(Token, usize)>,
    pos: usize,
    package: Option<FQName>,
    java_compatible: bool,
}

impl Parser {
    fn error(&self, message: impl Into<String>) -> ParseError {
        let line = match self.tokens.get(self.pos) {
            Some((_, line)) => *line,
            None => self.tokens.last().map(|(_, line)| *line).unwrap_or(1),
        };
        ParseError {
            path: self.path.clone(),
            line,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat_punct(&mut self, punct: &str) -> bool {
        if matches!(self.peek(), Some(Token::Punct(p)) if *p == punct) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, punct: &str) -> Result<(), ParseError> {
        if self.eat_punct(punct) {
            Ok(())
        } else {
            let found = self.describe_next();
            Err(self.error(format!("expected `{punct}`, found {found}")))
        }
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        if let Some(Token::Ident(name)) = self.peek() {
            let name = name.clone();
            self.pos += 1;
            Ok(name)
        } else {
            let found = self.describe_next();
            Err(self.error(format!("expected identifier, found {found}")))
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if matches!(self.peek(), Some(Token::Ident(name)) if name == keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn describe_next(&self) -> String {
        match self.peek() {
            Some(token) => format!("`{}`", token.text()),
            None => "end of file".to_string(),
        }
    }

    fn parse(mut self) -> Result<Ast, ParseError> {
        let package = self.parse_package_decl()?;
        self.package = Some(package.clone());

        let mut imports = Vec::new();
        while self.eat_keyword("import") {
            imports.push(self.parse_import()?);
        }

        let mut sub_types = Vec::new();
        let mut interface = None;

        while self.peek().is_some() {
            let exported = self.eat_export_annotation()?;
            match self.peek().cloned() {
                Some(Token::Ident(name)) if name == "interface" => {
                    if exported {
                        return Err(self.error("@export applies to type declarations only"));
                    }
                    if interface.is_some() {
                        return Err(self.error("more than one interface declared"));
                    }
                    interface = Some(self.parse_interface(&package)?);
                }
                Some(Token::Ident(name))
                    if matches!(name.as_str(), "enum" | "struct" | "union" | "typedef") =>
                {
                    sub_types.push(self.parse_named_type(&package, None, exported)?);
                }
                _ => {
                    let found = self.describe_next();
                    return Err(self.error(format!("expected declaration, found {found}")));
                }
            }
        }

        Ok(Ast::new(
            package,
            self.path.clone().into(),
            imports,
            Scope::new(sub_types),
            interface,
            self.java_compatible,
        ))
    }

    fn parse_package_decl(&mut self) -> Result<FQName, ParseError> {
        if !self.eat_keyword("package") {
            return Err(self.error("expected `package` declaration"));
        }
        let fq = self.parse_fqname(None)?;
        self.expect_punct(";")?;
        if fq.is_fully_qualified() {
            return Err(self.error("package declaration must not name an interface"));
        }
        Ok(fq)
    }

    fn parse_import(&mut self) -> Result<FQName, ParseError> {
        let package = self.package.clone();
        let fq = self.parse_fqname(package.as_ref())?;
        self.expect_punct(";")?;
        Ok(fq)
    }

    /// Parse an FQName token sequence. When `relative_to` is given, the
    /// leading package may be omitted (`@1.0::IFoo`).
    fn parse_fqname(&mut self, relative_to: Option<&FQName>) -> Result<FQName, ParseError> {
        let mut text = String::new();

        if matches!(self.peek(), Some(Token::Punct("@"))) {
            let base = relative_to.ok_or_else(|| self.error("relative name not allowed here"))?;
            text.push_str(base.package());
        }

        loop {
            match self.peek() {
                Some(Token::Ident(_)) | Some(Token::Number(_)) => {
                    text.push_str(self.next().unwrap().text());
                }
                Some(Token::Punct(p)) if matches!(*p, "@" | "." | "::") => {
                    text.push_str(self.next().unwrap().text());
                }
                _ => break,
            }
        }

        FQName::parse(&text).map_err(|e| self.error(e.to_string()))
    }

    /// `@export` or `@export(name="...", ...)`; arguments are skipped.
    fn eat_export_annotation(&mut self) -> Result<bool, ParseError> {
        if !matches!(self.peek(), Some(Token::Punct("@"))) {
            return Ok(false);
        }
        let checkpoint = self.pos;
        self.pos += 1;
        match self.next() {
            Some(Token::Ident(name)) if name == "export" => {}
            _ => {
                self.pos = checkpoint;
                return Err(self.error("unknown annotation"));
            }
        }
        if self.eat_punct("(") {
            let mut depth = 1usize;
            while depth > 0 {
                match self.next() {
                    Some(Token::Punct("(")) => depth += 1,
                    Some(Token::Punct(")")) => depth -= 1,
                    Some(_) => {}
                    None => return Err(self.error("unterminated annotation arguments")),
                }
            }
        }
        Ok(true)
    }

    fn check_java_compat_type(&mut self, type_name: &str) {
        let base = type_name
            .split(['<', '['])
            .next()
            .unwrap_or(type_name)
            .trim();
        if JAVA_INCOMPATIBLE_TYPES.contains(&base) {
            self.java_compatible = false;
        }
    }

    /// A type use: dotted name with optional generic arguments and array
    /// suffix, captured as text.
    fn parse_type(&mut self) -> Result<String, ParseError> {
        let mut text = String::new();
        text.push_str(&self.expect_ident()?);

        while self.eat_punct(".") {
            text.push('.');
            text.push_str(&self.expect_ident()?);
        }

        if self.eat_punct("<") {
            text.push('<');
            let mut depth = 1usize;
            while depth > 0 {
                match self.next() {
                    Some(Token::Punct("<")) => {
                        depth += 1;
                        text.push('<');
                    }
                    Some(Token::Punct(">")) => {
                        depth -= 1;
                        text.push('>');
                    }
                    Some(Token::Punct(">>")) => {
                        if depth < 2 {
                            return Err(self.error("unbalanced `>>` in generic arguments"));
                        }
                        depth -= 2;
                        text.push_str(">>");
                    }
                    Some(Token::Punct(",")) => {
                        text.push_str(", ");
                    }
                    Some(token) => text.push_str(token.text()),
                    None => return Err(self.error("unterminated generic arguments")),
                }
            }
        }

        while self.eat_punct("[") {
            text.push('[');
            loop {
                match self.next() {
                    Some(Token::Punct("]")) => break,
                    Some(token) => text.push_str(token.text()),
                    None => return Err(self.error("unterminated array bound")),
                }
            }
            text.push(']');
        }

        self.check_java_compat_type(&text);
        Ok(text)
    }

    fn parse_named_type(
        &mut self,
        package: &FQName,
        enclosing: Option<&str>,
        exported: bool,
    ) -> Result<NamedType, ParseError> {
        let keyword = self.expect_ident()?;

        match keyword.as_str() {
            "typedef" => {
                let aliased = self.parse_type()?;
                let name = self.expect_ident()?;
                self.expect_punct(";")?;
                Ok(self.named(package, enclosing, name, TypeDetail::TypeDef { aliased }, exported))
            }
            "enum" => {
                let name = self.expect_ident()?;
                let storage = if self.eat_punct(":") {
                    self.parse_type()?
                } else {
                    "int32_t".to_string()
                };
                self.expect_punct("{")?;
                let values = self.parse_enum_values()?;
                self.expect_punct(";")?;
                Ok(self.named(
                    package,
                    enclosing,
                    name,
                    TypeDetail::Enum { storage, values },
                    exported,
                ))
            }
            "struct" => {
                let name = self.expect_ident()?;
                self.expect_punct("{")?;
                let fields = self.parse_fields()?;
                self.expect_punct(";")?;
                Ok(self.named(package, enclosing, name, TypeDetail::Struct { fields }, exported))
            }
            "union" => {
                self.java_compatible = false;
                let name = self.expect_ident()?;
                self.expect_punct("{")?;
                let fields = self.parse_fields()?;
                self.expect_punct(";")?;
                Ok(self.named(package, enclosing, name, TypeDetail::Union { fields }, exported))
            }
            other => Err(self.error(format!("expected type declaration, found `{other}`"))),
        }
    }

    fn named(
        &self,
        package: &FQName,
        enclosing: Option<&str>,
        name: String,
        detail: TypeDetail,
        exported: bool,
    ) -> NamedType {
        let qualified = match enclosing {
            Some(iface) => format!("{iface}.{name}"),
            None => name.clone(),
        };
        NamedType::new(package.with_name(qualified), name, detail, exported)
    }

    fn parse_enum_values(&mut self) -> Result<Vec<EnumValue>, ParseError> {
        let mut values = Vec::new();
        loop {
            if self.eat_punct("}") {
                return Ok(values);
            }
            let name = self.expect_ident()?;
            let mut value = None;
            if self.eat_punct("=") {
                let mut text = String::new();
                while let Some(token) = self.peek() {
                    if matches!(token, Token::Punct(",") | Token::Punct("}")) {
                        break;
                    }
                    if !text.is_empty() {
                        text.push(' ');
                    }
                    text.push_str(self.next().unwrap().text());
                }
                value = Some(text);
            }
            values.push(EnumValue { name, value });
            if !self.eat_punct(",") {
                self.expect_punct("}")?;
                return Ok(values);
            }
        }
    }

    fn parse_fields(&mut self) -> Result<Vec<Field>, ParseError> {
        let mut fields = Vec::new();
        while !self.eat_punct("}") {
            let type_name = self.parse_type()?;
            let name = self.expect_ident()?;
            self.expect_punct(";")?;
            fields.push(Field { type_name, name });
        }
        Ok(fields)
    }

    fn parse_interface(&mut self, package: &FQName) -> Result<Interface, ParseError> {
        self.expect_ident()?; // the `interface` keyword
        let name = self.expect_ident()?;
        let fq_name = package.with_name(&name);

        if !fq_name.is_interface_name() {
            return Err(self.error(format!(
                "interface name `{name}` must start with `I` followed by an upper-case letter"
            )));
        }

        let super_iface = if self.eat_keyword("extends") {
            Some(self.parse_fqname(Some(package))?)
        } else if fq_name == *IBASE {
            None
        } else {
            Some(IBASE.clone())
        };

        self.expect_punct("{")?;

        let mut methods = Vec::new();
        let mut types = Vec::new();

        loop {
            if self.eat_punct("}") {
                break;
            }
            let exported = self.eat_export_annotation()?;
            match self.peek().cloned() {
                Some(Token::Ident(kw))
                    if matches!(kw.as_str(), "enum" | "struct" | "union" | "typedef") =>
                {
                    types.push(self.parse_named_type(package, Some(&name), exported)?);
                }
                Some(Token::Ident(_)) => {
                    if exported {
                        return Err(self.error("@export applies to type declarations only"));
                    }
                    methods.push(self.parse_method()?);
                }
                _ => return Err(self.error("expected method or type declaration")),
            }
        }
        self.expect_punct(";")?;

        Ok(Interface::new(fq_name, super_iface, methods, types))
    }

    fn parse_method(&mut self) -> Result<Method, ParseError> {
        let oneway = self.eat_keyword("oneway");
        let name = self.expect_ident()?;

        self.expect_punct("(")?;
        let args = self.parse_params()?;

        let results = if self.eat_keyword("generates") {
            self.expect_punct("(")?;
            self.parse_params()?
        } else {
            Vec::new()
        };

        self.expect_punct(";")?;

        if oneway && !results.is_empty() {
            return Err(self.error(format!("oneway method `{name}` cannot generate results")));
        }

        Ok(Method {
            name,
            args,
            results,
            oneway,
        })
    }

    fn parse_params(&mut self) -> Result<Vec<Field>, ParseError> {
        let mut params = Vec::new();
        if self.eat_punct(")") {
            return Ok(params);
        }
        loop {
            let type_name = self.parse_type()?;
            let name = self.expect_ident()?;
            params.push(Field { type_name, name });
            if self.eat_punct(")") {
                return Ok(params);
            }
            self.expect_punct(",")?;
        }
    }
}
