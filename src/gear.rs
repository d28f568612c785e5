/// 装备树模块
///
/// 角色拥有的物品可以互相嵌套（改装件装在武器上、弹药装在弹匣里），
/// 形成一棵严格的父子树。树使用竞技场（arena）存储：节点保存在一个
/// 扁平向量中，父子关系通过稳定的整数句柄表达，跨节点引用一律使用
/// 句柄或 GUID，不使用对象引用，从而排除环状所有权。
use crate::document::Element;

/// 装备节点句柄
///
/// 指向所属 `GearArena` 内部向量的稳定索引。
/// 节点从不删除单个元素，句柄在竞技场生命周期内保持有效。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GearId(pub(crate) usize);

/// 装备节点
///
/// GUID 在节点创建时分配一次，此后在所有加载/保存循环中保持不变。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GearNode {
    /// 稳定标识符（GUID 形式字符串，加载时来自文档，新建时由调用方提供）
    pub guid: String,
    /// 显示名称
    pub name: Option<String>,
    /// 类别标签
    pub category: Option<String>,
    /// 数量（`None` = 源文档未写 qty 属性）
    pub quantity: Option<u32>,
    /// 当前版式不认识的属性，按出现顺序保留
    pub extra_attrs: Vec<(String, String)>,
    /// 当前版式不认识的子元素，按出现顺序保留
    pub extensions: Vec<Element>,
    /// 子节点句柄，保持文档顺序
    pub children: Vec<GearId>,
}

/// 装备树竞技场
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GearArena {
    nodes: Vec<GearNode>,
    roots: Vec<GearId>,
}

impl GearArena {
    /// 创建空竞技场
    pub fn new() -> Self {
        GearArena::default()
    }

    /// 分配一个节点，返回其句柄
    ///
    /// # 参数
    /// * `node` - 节点内容（`children` 一般为空，随后通过 `attach_*` 挂接）
    pub fn alloc(&mut self, node: GearNode) -> GearId {
        let id = GearId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// 将节点挂接为顶层节点
    pub fn attach_root(&mut self, id: GearId) {
        self.roots.push(id);
    }

    /// 将节点挂接为另一节点的子节点
    pub fn attach_child(&mut self, parent: GearId, child: GearId) {
        self.nodes[parent.0].children.push(child);
    }

    /// 顶层节点句柄，保持文档顺序
    pub fn roots(&self) -> &[GearId] {
        &self.roots
    }

    /// 读取节点
    pub fn get(&self, id: GearId) -> &GearNode {
        &self.nodes[id.0]
    }

    /// 读取节点（可变）
    pub fn get_mut(&mut self, id: GearId) -> &mut GearNode {
        &mut self.nodes[id.0]
    }

    /// 节点总数
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// 竞技场是否为空
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// 按 GUID 查找节点句柄
    pub fn find_by_guid(&self, guid: &str) -> Option<GearId> {
        self.nodes
            .iter()
            .position(|node| node.guid == guid)
            .map(GearId)
    }

    /// 深度优先前序遍历整棵树
    ///
    /// 遍历顺序即保存器的序列化顺序：父节点先于子节点，
    /// 兄弟节点按文档顺序。
    pub fn iter_preorder(&self) -> PreorderIter<'_> {
        let mut stack: Vec<(GearId, usize)> = Vec::with_capacity(self.roots.len());
        for root in self.roots.iter().rev() {
            stack.push((*root, 0));
        }
        PreorderIter { arena: self, stack }
    }

    /// 从某个节点开始的子树最大深度（根计为 1）
    pub fn depth_of(&self, id: GearId) -> usize {
        1 + self
            .get(id)
            .children
            .iter()
            .map(|child| self.depth_of(*child))
            .max()
            .unwrap_or(0)
    }

    /// 整棵树的最大嵌套深度
    pub fn max_depth(&self) -> usize {
        self.roots
            .iter()
            .map(|root| self.depth_of(*root))
            .max()
            .unwrap_or(0)
    }
}

/// 前序遍历迭代器，产出 (句柄, 嵌套深度)
pub struct PreorderIter<'a> {
    arena: &'a GearArena,
    stack: Vec<(GearId, usize)>,
}

impl<'a> Iterator for PreorderIter<'a> {
    type Item = (GearId, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (id, depth) = self.stack.pop()?;
        let node = self.arena.get(id);
        for child in node.children.iter().rev() {
            self.stack.push((*child, depth + 1));
        }
        Some((id, depth))
    }
}
