/// 通用文档树模块
///
/// 该模块定义持久化文档的内存表示：一棵有序的元素-属性树。
/// 加载器、保存器、迁移链和结构对比全部在这棵树上工作。
///
/// - **parser**: 游标式文本解析器
/// - **writer**: 规范化序列化器（确定性输出）
pub mod parser;
pub mod writer;


pub use parser::parse_document;
pub use writer::write_document;

/// 文档元素
///
/// 属性保持文档出现顺序，子元素保持文档出现顺序。
/// 不支持混合内容：一个元素要么持有文本，要么持有子元素。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// 元素名
    pub name: String,
    /// 有序属性列表 (名称, 值)
    pub attributes: Vec<(String, String)>,
    /// 有序子元素
    pub children: Vec<Element>,
    /// 文本内容（叶子元素）
    pub text: String,
}

impl Element {
    /// 创建空元素
    pub fn new(name: impl Into<String>) -> Self {
        Element {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            text: String::new(),
        }
    }

    /// 创建带文本的叶子元素
    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Element {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            text: text.into(),
        }
    }

    /// 读取属性值
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(attr_name, _)| attr_name == name)
            .map(|(_, value)| value.as_str())
    }

    /// 设置属性值（存在则覆盖，保持原位置；不存在则追加）
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(attr_name, _)| attr_name == name) {
            Some(entry) => entry.1 = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    /// 查找第一个指定名称的子元素
    pub fn find_child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    /// 查找第一个指定名称的子元素（可变）
    pub fn find_child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.children.iter_mut().find(|child| child.name == name)
    }

    /// 按名称过滤子元素，保持文档顺序
    pub fn find_children<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// 读取指定子元素的文本内容
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.find_child(name).map(|child| child.text.as_str())
    }

    /// 追加子元素
    pub fn push_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// 统计整棵子树的元素数量（含自身）
    pub fn subtree_size(&self) -> usize {
        1 + self.children.iter().map(Element::subtree_size).sum::<usize>()
    }
}
