use super::Element;
use crate::datatypes::unescape_text;
use crate::utils::SheetError;

/// 最大嵌套深度（防御损坏文档导致的栈溢出）
const MAX_NESTING_DEPTH: usize = 64;

/// 文本游标
///
/// 在输入上维护字节位置与行列号，所有解析错误都携带精确位置。
struct DocCursor<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> DocCursor<'a> {
    fn new(input: &'a str) -> Self {
        DocCursor { input, pos: 0, line: 1, column: 1 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.rest().starts_with(prefix)
    }

    /// 前进一个字符并维护行列号
    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// 前进若干字节（调用方保证边界落在字符边界上）
    fn advance(&mut self, bytes: usize) {
        let target = self.pos + bytes;
        while self.pos < target {
            if self.bump().is_none() {
                break;
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    /// 在当前位置构造解析错误
    fn error(&self, detail: impl Into<String>) -> SheetError {
        SheetError::malformed(self.line, self.column, detail)
    }

    fn expect(&mut self, expected: char) -> Result<(), SheetError> {
        match self.peek() {
            Some(c) if c == expected => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected '{}', found '{}'", expected, c))),
            None => Err(self.error(format!("expected '{}', found end of input", expected))),
        }
    }

    /// 读取元素名或属性名
    fn read_name(&mut self) -> Result<String, SheetError> {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':') {
                name.push(c);
                self.bump();
            } else {
                break;
            }
        }

        if name.is_empty() {
            return Err(self.error("expected a name"));
        }
        if name.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(self.error(format!("invalid name \"{}\"", name)));
        }
        Ok(name)
    }

    /// 跳过注释与空白，直到下一个有效记号
    fn skip_trivia(&mut self) -> Result<(), SheetError> {
        loop {
            self.skip_whitespace();
            if self.starts_with("<!--") {
                match self.rest().find("-->") {
                    Some(end) => self.advance(end + 3),
                    None => return Err(self.error("unterminated comment")),
                }
            } else {
                return Ok(());
            }
        }
    }
}

/// 解析文档文本为元素树
///
/// 支持的子集：声明头、元素、有序属性、文本内容、注释、预定义实体。
/// 不支持 CDATA、命名空间与混合内容。
///
/// # 参数
/// * `input` - 已解码的文档文本
///
/// # 返回
/// 返回根元素；任何结构性问题都以 `MalformedDocument` 报告，不产生部分结果
pub fn parse_document(input: &str) -> Result<Element, SheetError> {
    let mut cursor = DocCursor::new(input);

    cursor.skip_whitespace();

    // 可选的声明头
    if cursor.starts_with("<?xml") {
        match cursor.rest().find("?>") {
            Some(end) => cursor.advance(end + 2),
            None => return Err(cursor.error("unterminated declaration")),
        }
    }

    cursor.skip_trivia()?;

    if cursor.at_end() {
        return Err(cursor.error("document has no root element"));
    }

    let root = parse_element(&mut cursor, 0)?;

    cursor.skip_trivia()?;
    if !cursor.at_end() {
        return Err(cursor.error("content after root element"));
    }

    Ok(root)
}

/// 解析单个元素（递归）
fn parse_element(cursor: &mut DocCursor, depth: usize) -> Result<Element, SheetError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(cursor.error(format!("nesting deeper than {} levels", MAX_NESTING_DEPTH)));
    }

    cursor.expect('<')?;
    let name = cursor.read_name()?;
    let mut element = Element::new(name);

    // 属性列表
    loop {
        cursor.skip_whitespace();

        if cursor.starts_with("/>") {
            cursor.advance(2);
            return Ok(element);
        }
        if cursor.starts_with(">") {
            cursor.bump();
            break;
        }

        let attr_name = cursor.read_name()?;
        if element.attr(&attr_name).is_some() {
            return Err(cursor.error(format!("duplicate attribute \"{}\"", attr_name)));
        }

        cursor.skip_whitespace();
        cursor.expect('=')?;
        cursor.skip_whitespace();

        let quote = match cursor.peek() {
            Some(c @ ('"' | '\'')) => {
                cursor.bump();
                c
            }
            _ => return Err(cursor.error("attribute value must be quoted")),
        };

        let value_start = cursor.pos;
        let raw_value = match cursor.rest().find(quote) {
            Some(end) => {
                let value = &cursor.input[value_start..value_start + end];
                cursor.advance(end + 1);
                value
            }
            None => return Err(cursor.error("unterminated attribute value")),
        };

        let value = unescape_text(raw_value).map_err(|e| cursor.error(e))?;
        element.attributes.push((attr_name, value));
    }

    // 内容：文本或子元素，不允许混合
    let mut text = String::new();
    loop {
        if cursor.starts_with("<!--") {
            cursor.skip_trivia()?;
            continue;
        }

        if cursor.starts_with("</") {
            cursor.advance(2);
            let close_name = cursor.read_name()?;
            if close_name != element.name {
                return Err(cursor.error(format!(
                    "mismatched closing tag: expected </{}>, found </{}>",
                    element.name, close_name
                )));
            }
            cursor.skip_whitespace();
            cursor.expect('>')?;
            break;
        }

        match cursor.peek() {
            Some('<') => {
                if !text.trim().is_empty() {
                    return Err(cursor.error(format!(
                        "mixed content in element <{}>",
                        element.name
                    )));
                }
                text.clear();
                let child = parse_element(cursor, depth + 1)?;
                element.children.push(child);
            }
            Some(_) => {
                if !element.children.is_empty() {
                    // 子元素之间只允许空白
                    let run_start = cursor.pos;
                    while matches!(cursor.peek(), Some(c) if c != '<') {
                        cursor.bump();
                    }
                    let run = &cursor.input[run_start..cursor.pos];
                    if !run.trim().is_empty() {
                        return Err(cursor.error(format!(
                            "mixed content in element <{}>",
                            element.name
                        )));
                    }
                } else {
                    while matches!(cursor.peek(), Some(c) if c != '<') {
                        if let Some(c) = cursor.bump() {
                            text.push(c);
                        }
                    }
                }
            }
            None => {
                return Err(cursor.error(format!("unclosed element <{}>", element.name)));
            }
        }
    }

    if element.children.is_empty() {
        element.text = unescape_text(&text).map_err(|e| cursor.error(e))?;
    }

    Ok(element)
}
