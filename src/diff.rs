/// 结构对比模块
///
/// 回归校验的核心：比较两份序列化文档（对照与测试）的结构差异，
/// 排除一组按名称声明的非确定性节点（默认只有肖像节点 `mugshot`）。
/// 保存器输出的顺序是规范化的，所以排除肖像之后的对比是精确匹配，
/// 不需要任何模糊的兄弟节点匹配规则。
use crate::document::{parse_document, Element};
use crate::utils::SheetError;

/// 对比选项
#[derive(Debug, Clone)]
pub struct DiffOptions {
    /// 按名称排除的节点（整棵子树不参与对比）
    pub excluded_nodes: Vec<String>,
}

impl Default for DiffOptions {
    fn default() -> Self {
        DiffOptions {
            excluded_nodes: vec!["mugshot".to_string()],
        }
    }
}

/// 单条结构差异
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentDifference {
    /// 差异所在位置，如 `/character/gears/gear[1]/name`
    pub path: String,
    /// 差异描述
    pub detail: String,
}

impl std::fmt::Display for DocumentDifference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.detail)
    }
}

/// 比较两棵文档树
///
/// # 参数
/// * `control` - 对照树
/// * `test` - 测试树
/// * `options` - 排除规则
///
/// # 返回
/// 全部结构差异；空向量表示排除节点之外完全一致
pub fn compare_documents(
    control: &Element,
    test: &Element,
    options: &DiffOptions,
) -> Vec<DocumentDifference> {
    let mut differences = Vec::new();
    compare_elements(control, test, &format!("/{}", control.name), options, &mut differences);
    differences
}

/// 比较两份文档文本（先解析再对比）
pub fn compare_document_texts(
    control: &str,
    test: &str,
    options: &DiffOptions,
) -> Result<Vec<DocumentDifference>, SheetError> {
    let control_tree = parse_document(control)?;
    let test_tree = parse_document(test)?;
    Ok(compare_documents(&control_tree, &test_tree, options))
}

/// 递归比较单对元素
fn compare_elements(
    control: &Element,
    test: &Element,
    path: &str,
    options: &DiffOptions,
    differences: &mut Vec<DocumentDifference>,
) {
    if control.name != test.name {
        differences.push(DocumentDifference {
            path: path.to_string(),
            detail: format!("element name <{}> vs <{}>", control.name, test.name),
        });
        // 名称都不同时继续深入没有意义
        return;
    }

    if control.attributes != test.attributes {
        differences.push(DocumentDifference {
            path: path.to_string(),
            detail: format!(
                "attributes {:?} vs {:?}",
                control.attributes, test.attributes
            ),
        });
    }

    if control.text != test.text {
        differences.push(DocumentDifference {
            path: path.to_string(),
            detail: format!("text {:?} vs {:?}", control.text, test.text),
        });
    }

    let control_children = filtered_children(control, options);
    let test_children = filtered_children(test, options);

    if control_children.len() != test_children.len() {
        differences.push(DocumentDifference {
            path: path.to_string(),
            detail: format!(
                "child count {} vs {}",
                control_children.len(),
                test_children.len()
            ),
        });
    }

    for (index, (control_child, test_child)) in
        control_children.iter().zip(test_children.iter()).enumerate()
    {
        let child_path = format!("{}/{}[{}]", path, control_child.name, index);
        compare_elements(control_child, test_child, &child_path, options, differences);
    }
}

/// 过滤掉被排除的子节点
fn filtered_children<'a>(element: &'a Element, options: &DiffOptions) -> Vec<&'a Element> {
    element
        .children
        .iter()
        .filter(|child| !options.excluded_nodes.iter().any(|name| name == &child.name))
        .collect()
}
