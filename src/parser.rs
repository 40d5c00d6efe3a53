//! Reference parser for the generated-file dialect.
//!
//! The merge engine itself is parser-agnostic: it consumes [`Module`] trees
//! through the [`SourceSyntax`](crate::syntax::SourceSyntax) trait. This
//! module provides the reference implementation, a recursive-descent parser
//! covering the dialect the design tool emits plus the expression shapes
//! developers commonly add around it. Anything it cannot classify inside a
//! recognized context becomes an [`Expr::Opaque`] via a balanced-bracket
//! scan; malformed markup fails the parse (there is no recovery, an
//! unparsable input aborts the merge).
//!
//! Two normalizations are applied: whitespace-only JSX text children are
//! dropped, and text children are trimmed. Import declarations are anchored
//! to column zero on output.

use std::sync::LazyLock;

use regex::Regex;

use crate::ast::{
    AttrValue, BoolLit, CallExpr, Expr, Ident, ImportDecl, ImportSpecifier, JsxAttr, JsxChild,
    JsxElement, JsxExprContainer, JsxText, LogicalExpr, LogicalOp, ManagedStmt, MemberExpr, Module,
    ModuleItem, NamedAttr, OpaqueExpr, RawChunk, Span, SpreadAttr, StrLit,
};

/// Marker comment identifying the managed markup expression and its base
/// revision.
static MANAGED_JSX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/\*\s*plasmic-managed-jsx/(\d+)\s*\*/").unwrap());

pub fn parse_module(source: &str) -> Result<Module, String> {
    let marker = MANAGED_JSX_RE.captures(source).map(|caps| {
        let whole = caps.get(0).unwrap();
        let revision = caps[1].parse::<u64>().unwrap_or(0);
        (whole.start(), whole.end(), revision)
    });

    let mut items = Vec::new();
    let mut raw_start = 0usize;
    let mut pos = 0usize;
    let mut marker_consumed = false;

    while pos < source.len() {
        let line_end = source[pos..]
            .find('\n')
            .map_or(source.len(), |i| pos + i + 1);

        if let Some((marker_start, marker_end, revision)) = marker
            && !marker_consumed
            && (pos..line_end).contains(&marker_start)
        {
            let head = source[raw_start..marker_start].to_owned();
            let mut exprs = ExprParser {
                src: source,
                pos: marker_end,
            };
            let expr = exprs.parse_expr(&[';', ')'])?;
            items.push(ModuleItem::Managed(ManagedStmt {
                head,
                revision,
                expr,
                span: Span::new(marker_start, exprs.pos),
            }));
            marker_consumed = true;
            pos = exprs.pos;
            raw_start = exprs.pos;
            continue;
        }

        let line = &source[pos..line_end];
        let trimmed = line.trim_start();
        if trimmed.starts_with("import ") || trimmed.trim_end() == "import" {
            let kw_start = pos + (line.len() - trimmed.len());
            let (leading_comments, comments_start) =
                leading_comment_lines(source, raw_start, pos);
            flush_raw(&mut items, source, raw_start, comments_start);
            let (decl, after) = parse_import(source, kw_start, leading_comments)?;
            items.push(ModuleItem::Import(decl));
            pos = after;
            raw_start = after;
            continue;
        }

        pos = line_end;
    }
    flush_raw(&mut items, source, raw_start, source.len());
    Ok(Module { items })
}

fn flush_raw(items: &mut Vec<ModuleItem>, source: &str, start: usize, end: usize) {
    if start < end {
        items.push(ModuleItem::Raw(RawChunk {
            text: source[start..end].to_owned(),
        }));
    }
}

/// Collects the contiguous run of full-line comments directly above `pos`
/// (they belong to the import declaration starting there, not to the raw
/// chunk before it).
fn leading_comment_lines(source: &str, raw_start: usize, pos: usize) -> (Vec<String>, usize) {
    let mut comments = Vec::new();
    let mut cut = pos;
    let region = &source[raw_start..pos];
    let mut line_starts: Vec<usize> = vec![raw_start];
    for (i, b) in region.bytes().enumerate() {
        if b == b'\n' && raw_start + i + 1 < pos {
            line_starts.push(raw_start + i + 1);
        }
    }
    for &line_start in line_starts.iter().rev() {
        let line = source[line_start..cut].trim_end_matches('\n');
        let t = line.trim();
        let is_comment = t.starts_with("//") || (t.starts_with("/*") && t.ends_with("*/"));
        if t.is_empty() || !is_comment {
            break;
        }
        comments.insert(0, t.to_owned());
        cut = line_start;
    }
    (comments, cut)
}

fn parse_import(
    source: &str,
    start: usize,
    leading_comments: Vec<String>,
) -> Result<(ImportDecl, usize), String> {
    let semi = source[start..]
        .find(';')
        .map(|i| start + i)
        .ok_or_else(|| "unterminated import declaration".to_owned())?;
    let decl_text = &source[start + "import".len()..semi];

    let (clause, module) = match top_level_from(decl_text) {
        Some(i) => (&decl_text[..i], &decl_text[i + "from".len()..]),
        None => ("", decl_text),
    };
    let module = module.trim();
    let unquoted = module
        .strip_prefix('"')
        .and_then(|m| m.strip_suffix('"'))
        .or_else(|| module.strip_prefix('\'').and_then(|m| m.strip_suffix('\'')))
        .ok_or_else(|| format!("import source is not a string literal: {module}"))?;
    let specifiers = parse_import_clause(clause)?;

    let line_end = source[semi..]
        .find('\n')
        .map_or(source.len(), |i| semi + i);
    let rest = source[semi + 1..line_end].trim();
    let (trailing_comment, end) = match rest.strip_prefix("//") {
        Some(comment) => (
            Some(comment.trim().to_owned()),
            (line_end + 1).min(source.len()),
        ),
        None if rest.is_empty() => (None, (line_end + 1).min(source.len())),
        // something else shares the line; leave it for the raw scan
        None => (None, semi + 1),
    };

    Ok((
        ImportDecl {
            specifiers,
            source: unquoted.to_owned(),
            leading_comments,
            trailing_comment,
            span: Span::new(start, end),
        },
        end,
    ))
}

/// Index of the top-level `from` keyword in an import clause, skipping any
/// occurrence inside braces (`import { from as x } from "m"`).
fn top_level_from(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0i32;
    let mut i = 0;
    while i + 4 <= bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => depth -= 1,
            b'f' if depth == 0
                && text[i..].starts_with("from")
                && text[..i].ends_with(char::is_whitespace)
                && !text[..i].contains(['"', '\''])
                && text[i + 4..].starts_with(char::is_whitespace) =>
            {
                return Some(i);
            }
            _ => {}
        }
        i += 1;
    }
    None
}

fn parse_import_clause(clause: &str) -> Result<Vec<ImportSpecifier>, String> {
    let mut specifiers = Vec::new();
    for part in split_top_level(clause) {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        if let Some(inner) = part.strip_prefix('{') {
            let inner = inner
                .strip_suffix('}')
                .ok_or_else(|| format!("unbalanced braces in import clause: {part}"))?;
            for name in inner.split(',') {
                let name = name.trim();
                if name.is_empty() {
                    continue;
                }
                let (imported, local) = match name.split_once(" as ") {
                    Some((i, l)) => (i.trim(), l.trim()),
                    None => (name, name),
                };
                specifiers.push(ImportSpecifier::Named {
                    imported: imported.to_owned(),
                    local: local.to_owned(),
                });
            }
        } else if let Some(ns) = part.strip_prefix('*') {
            let local = ns
                .trim()
                .strip_prefix("as")
                .map(str::trim)
                .ok_or_else(|| format!("malformed namespace import: {part}"))?;
            specifiers.push(ImportSpecifier::Namespace {
                local: local.to_owned(),
            });
        } else {
            specifiers.push(ImportSpecifier::Default {
                local: part.to_owned(),
            });
        }
    }
    Ok(specifiers)
}

fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

/// A parse failure below the expression level. `Soft` failures fall back to
/// an opaque balanced scan; `Fatal` failures (malformed markup) abort.
enum Fail {
    Soft,
    Fatal(String),
}

pub(crate) struct ExprParser<'s> {
    pub(crate) src: &'s str,
    pub(crate) pos: usize,
}

impl<'s> ExprParser<'s> {
    pub(crate) fn new(src: &'s str) -> Self {
        Self { src, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.src[self.pos..].starts_with(prefix)
    }

    fn expect(&mut self, c: char) -> Result<(), String> {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            Ok(())
        } else {
            Err(format!(
                "expected `{c}` at byte {} but found {:?}",
                self.pos,
                self.peek()
            ))
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.starts_with("//") => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some('/') if self.starts_with("/*") => {
                    self.pos += 2;
                    match self.src[self.pos..].find("*/") {
                        Some(i) => self.pos += i + 2,
                        None => self.pos = self.src.len(),
                    }
                }
                _ => return,
            }
        }
    }

    fn at_stop(&self, stops: &[char]) -> bool {
        match self.peek() {
            None => true,
            Some(c) => stops.contains(&c),
        }
    }

    /// Parses one expression, stopping (without consuming) at any of `stops`
    /// at bracket depth zero. Falls back to an opaque scan for anything the
    /// typed grammar does not cover.
    pub(crate) fn parse_expr(&mut self, stops: &[char]) -> Result<Expr, String> {
        self.skip_trivia();
        let start = self.pos;
        match self.try_parse_logical() {
            Ok(expr) => {
                let end = self.pos;
                self.skip_trivia();
                if self.at_stop(stops) {
                    self.pos = end;
                    Ok(expr)
                } else {
                    self.pos = start;
                    self.opaque_until(stops)
                }
            }
            Err(Fail::Fatal(message)) => Err(message),
            Err(Fail::Soft) => {
                self.pos = start;
                self.opaque_until(stops)
            }
        }
    }

    fn try_parse_logical(&mut self) -> Result<Expr, Fail> {
        let start = self.pos;
        let mut expr = self.try_parse_primary()?;
        loop {
            let checkpoint = self.pos;
            self.skip_trivia();
            let op = if self.starts_with("&&") {
                LogicalOp::And
            } else if self.starts_with("||") {
                LogicalOp::Or
            } else {
                self.pos = checkpoint;
                return Ok(expr);
            };
            self.pos += 2;
            let right = self.try_parse_primary()?;
            expr = Expr::Logical(Box::new(LogicalExpr {
                op,
                left: expr,
                right,
                span: Span::new(start, self.pos),
            }));
        }
    }

    fn try_parse_primary(&mut self) -> Result<Expr, Fail> {
        self.skip_trivia();
        match self.peek() {
            None => Err(Fail::Soft),
            Some('<') => self
                .parse_jsx_element()
                .map(|el| Expr::Jsx(Box::new(el)))
                .map_err(Fail::Fatal),
            Some(q @ ('"' | '\'')) => self.parse_string_lit(q).map(Expr::Str).map_err(Fail::Fatal),
            Some('(') => {
                // parenthesized groups are transparent; anything that fails
                // inside (like an arrow parameter list) falls back to an
                // opaque scan of the whole group
                self.bump();
                let Ok(inner) = self.parse_expr(&[')']) else {
                    return Err(Fail::Soft);
                };
                self.skip_trivia();
                if self.expect(')').is_err() {
                    return Err(Fail::Soft);
                }
                Ok(inner)
            }
            Some(c) if is_ident_start(c) => {
                let start = self.pos;
                let name = self.parse_ident();
                match name.as_str() {
                    "true" | "false" => Ok(Expr::Bool(BoolLit {
                        value: name == "true",
                        span: Span::new(start, self.pos),
                    })),
                    "null" => Ok(Expr::Null(Span::new(start, self.pos))),
                    _ => self.parse_member_or_call_chain(Expr::Ident(Ident {
                        name,
                        span: Span::new(start, self.pos),
                    })),
                }
            }
            _ => Err(Fail::Soft),
        }
    }

    fn parse_member_or_call_chain(&mut self, mut expr: Expr) -> Result<Expr, Fail> {
        let start = expr.span().start;
        loop {
            let checkpoint = self.pos;
            self.skip_trivia();
            match self.peek() {
                Some('.') => {
                    self.bump();
                    self.skip_trivia();
                    if !self.peek().is_some_and(is_ident_start) {
                        return Err(Fail::Soft);
                    }
                    let property = self.parse_ident();
                    expr = Expr::Member(Box::new(MemberExpr {
                        object: expr,
                        property,
                        span: Span::new(start, self.pos),
                    }));
                }
                Some('(') => {
                    self.bump();
                    let mut args = Vec::new();
                    loop {
                        self.skip_trivia();
                        if self.peek() == Some(')') {
                            self.bump();
                            break;
                        }
                        args.push(self.parse_expr(&[',', ')']).map_err(Fail::Fatal)?);
                        self.skip_trivia();
                        if self.peek() == Some(',') {
                            self.bump();
                        }
                    }
                    expr = Expr::Call(Box::new(CallExpr {
                        callee: expr,
                        args,
                        span: Span::new(start, self.pos),
                    }));
                }
                _ => {
                    self.pos = checkpoint;
                    return Ok(expr);
                }
            }
        }
    }

    fn parse_ident(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                self.bump();
            } else {
                break;
            }
        }
        self.src[start..self.pos].to_owned()
    }

    fn parse_string_lit(&mut self, quote: char) -> Result<StrLit, String> {
        let start = self.pos;
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                None => return Err("unterminated string literal".to_owned()),
                Some('\\') => {
                    if let Some(escaped) = self.bump() {
                        if escaped != quote && escaped != '\\' {
                            value.push('\\');
                        }
                        value.push(escaped);
                    }
                }
                Some(c) if c == quote => break,
                Some(c) => value.push(c),
            }
        }
        Ok(StrLit {
            value,
            span: Span::new(start, self.pos),
        })
    }

    /// Balanced scan for an expression the typed grammar cannot represent.
    /// Tracks brackets, strings, template literals and comments; ends at a
    /// stop character or an unbalanced closer at depth zero.
    fn opaque_until(&mut self, stops: &[char]) -> Result<Expr, String> {
        self.skip_trivia();
        let start = self.pos;
        let mut depth = 0i32;
        while let Some(c) = self.peek() {
            if depth == 0 && stops.contains(&c) {
                break;
            }
            match c {
                '(' | '[' | '{' => {
                    depth += 1;
                    self.bump();
                }
                ')' | ']' | '}' => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                    self.bump();
                }
                '"' | '\'' | '`' => {
                    self.parse_string_lit(c)?;
                }
                '/' if self.starts_with("//") || self.starts_with("/*") => {
                    self.skip_trivia();
                }
                _ => {
                    self.bump();
                }
            }
        }
        let text = self.src[start..self.pos].trim_end();
        if text.is_empty() {
            return Err(format!("expected an expression at byte {start}"));
        }
        let end = start + text.len();
        self.pos = end;
        Ok(Expr::Opaque(OpaqueExpr {
            text: text.to_owned(),
            span: Span::new(start, end),
        }))
    }

    // -- JSX ---------------------------------------------------------------

    fn parse_jsx_element(&mut self) -> Result<JsxElement, String> {
        let start = self.pos;
        self.expect('<')?;
        let name = self.parse_jsx_name()?;
        let mut attrs = Vec::new();
        let self_closing = loop {
            self.skip_trivia();
            match self.peek() {
                Some('/') => {
                    self.bump();
                    self.expect('>')?;
                    break true;
                }
                Some('>') => {
                    self.bump();
                    break false;
                }
                Some('{') => {
                    let spread_start = self.pos;
                    self.bump();
                    self.skip_trivia();
                    if !self.starts_with("...") {
                        return Err(format!(
                            "expected a spread attribute at byte {spread_start}"
                        ));
                    }
                    self.pos += 3;
                    let expr = self.parse_expr(&['}'])?;
                    self.skip_trivia();
                    self.expect('}')?;
                    attrs.push(JsxAttr::Spread(SpreadAttr {
                        expr,
                        span: Span::new(spread_start, self.pos),
                    }));
                }
                Some(c) if is_ident_start(c) => {
                    attrs.push(self.parse_jsx_attr()?);
                }
                other => {
                    return Err(format!(
                        "unexpected {other:?} in element <{name}> at byte {}",
                        self.pos
                    ));
                }
            }
        };
        if self_closing {
            return Ok(JsxElement {
                name,
                attrs,
                children: Vec::new(),
                self_closing: true,
                span: Span::new(start, self.pos),
            });
        }

        let mut children = Vec::new();
        loop {
            if self.starts_with("</") {
                self.pos += 2;
                let close = self.parse_jsx_name()?;
                self.skip_trivia();
                self.expect('>')?;
                if close != name {
                    return Err(format!("element <{name}> closed by </{close}>"));
                }
                return Ok(JsxElement {
                    name,
                    attrs,
                    children,
                    self_closing: false,
                    span: Span::new(start, self.pos),
                });
            }
            match self.peek() {
                None => return Err(format!("unclosed element <{name}>")),
                Some('<') => {
                    let child = self.parse_jsx_element()?;
                    children.push(JsxChild::Element(Box::new(child)));
                }
                Some('{') => {
                    let container_start = self.pos;
                    self.bump();
                    let expr = self.parse_expr(&['}'])?;
                    self.skip_trivia();
                    self.expect('}')?;
                    children.push(JsxChild::Expr(JsxExprContainer {
                        expr,
                        span: Span::new(container_start, self.pos),
                    }));
                }
                Some(_) => {
                    let text_start = self.pos;
                    while let Some(c) = self.peek() {
                        if c == '<' || c == '{' {
                            break;
                        }
                        self.bump();
                    }
                    let raw = &self.src[text_start..self.pos];
                    let trimmed = raw.trim();
                    if !trimmed.is_empty() {
                        let lead = raw.len() - raw.trim_start().len();
                        children.push(JsxChild::Text(JsxText {
                            value: trimmed.to_owned(),
                            span: Span::new(text_start + lead, text_start + lead + trimmed.len()),
                        }));
                    }
                }
            }
        }
    }

    fn parse_jsx_attr(&mut self) -> Result<JsxAttr, String> {
        let start = self.pos;
        let name = self.parse_jsx_attr_name();
        self.skip_trivia();
        if self.peek() != Some('=') {
            return Ok(JsxAttr::Named(NamedAttr {
                name,
                value: None,
                span: Span::new(start, self.pos),
            }));
        }
        self.bump();
        self.skip_trivia();
        let value = match self.peek() {
            Some(q @ ('"' | '\'')) => AttrValue::Str(self.parse_string_lit(q)?),
            Some('{') => {
                let container_start = self.pos;
                self.bump();
                let expr = self.parse_expr(&['}'])?;
                self.skip_trivia();
                self.expect('}')?;
                AttrValue::Expr(JsxExprContainer {
                    expr,
                    span: Span::new(container_start, self.pos),
                })
            }
            other => return Err(format!("unexpected {other:?} as value of attribute {name}")),
        };
        Ok(JsxAttr::Named(NamedAttr {
            name,
            value: Some(value),
            span: Span::new(start, self.pos),
        }))
    }

    fn parse_jsx_name(&mut self) -> Result<String, String> {
        self.skip_trivia();
        if !self.peek().is_some_and(is_ident_start) {
            return Err(format!("expected an element name at byte {}", self.pos));
        }
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || matches!(c, '_' | '$' | '.' | '-') {
                self.bump();
            } else {
                break;
            }
        }
        Ok(self.src[start..self.pos].to_owned())
    }

    fn parse_jsx_attr_name(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || matches!(c, '_' | '$' | '-' | ':') {
                self.bump();
            } else {
                break;
            }
        }
        self.src[start..self.pos].to_owned()
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}
