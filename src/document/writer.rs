use super::Element;
use crate::datatypes::escape_text;

/// 每层缩进
const INDENT: &str = "    ";

/// 将元素树序列化为规范文档文本
///
/// 输出是输入树的确定性函数：相同的树永远产生相同的字节。
/// 属性按存储顺序写出，子元素按存储顺序写出，叶子元素不引入
/// 额外空白，空叶子写为自闭合形式。
pub fn write_document(root: &Element) -> String {
    let mut output = String::with_capacity(root.subtree_size() * 48);
    output.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    write_element(root, 0, &mut output);
    output
}

/// 写入单个元素（递归）
fn write_element(element: &Element, depth: usize, output: &mut String) {
    for _ in 0..depth {
        output.push_str(INDENT);
    }

    output.push('<');
    output.push_str(&element.name);
    for (name, value) in &element.attributes {
        output.push(' ');
        output.push_str(name);
        output.push_str("=\"");
        output.push_str(&escape_text(value));
        output.push('"');
    }

    if element.children.is_empty() {
        if element.text.is_empty() {
            output.push_str(" />\n");
        } else {
            output.push('>');
            output.push_str(&escape_text(&element.text));
            output.push_str("</");
            output.push_str(&element.name);
            output.push_str(">\n");
        }
        return;
    }

    output.push_str(">\n");
    for child in &element.children {
        write_element(child, depth + 1, output);
    }
    for _ in 0..depth {
        output.push_str(INDENT);
    }
    output.push_str("</");
    output.push_str(&element.name);
    output.push_str(">\n");
}
