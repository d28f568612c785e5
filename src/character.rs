use crate::document::Element;
use crate::gear::GearArena;
use crate::portrait::PortraitBlob;

/// 技能条目
///
/// 记录内的顺序即源文档中的出现顺序，编辑界面的排序视图
/// 不得回写到这里。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillEntry {
    /// 技能名
    pub name: String,
    /// 等级
    pub rating: i32,
    /// 专精（可选）
    pub specialization: Option<String>,
    /// 当前版式不认识的属性，按出现顺序保留
    pub extra_attrs: Vec<(String, String)>,
    /// 当前版式不认识的子元素，按出现顺序保留
    pub extensions: Vec<Element>,
}

/// 角色记录
///
/// 所有字段使用 `Option` 区分"源文档中不存在"与"存在但为空"：
/// 加载时不存在的字段保存时同样不写出，不会被默认值填充。
/// 未知的扩展节点原样保留在 `extensions` 中，使当前实现不认识
/// 的数据也能完整通过加载/保存循环。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CharacterRecord {
    /// 角色名
    pub name: Option<String>,
    /// 种族
    pub metatype: Option<String>,
    /// 原型
    pub archetype: Option<String>,
    /// 生命周期标志：false = 创建阶段，true = 生涯阶段
    pub created: Option<bool>,
    /// 装备树（`None` = 源文档没有 gears 节点）
    pub gear: Option<GearArena>,
    /// 技能列表（`None` = 源文档没有 skills 节点）
    pub skills: Option<Vec<SkillEntry>>,
    /// 自由文本备注
    pub notes: Option<String>,
    /// 肖像
    pub portrait: Option<PortraitBlob>,
    /// 当前版式不认识的根元素属性，按出现顺序保留
    pub extra_attrs: Vec<(String, String)>,
    /// 扩展袋：当前版式不认识的根级子节点，按出现顺序保留
    pub extensions: Vec<Element>,
}

impl CharacterRecord {
    /// 创建空记录
    pub fn new() -> Self {
        CharacterRecord::default()
    }

    /// 技能数量
    pub fn skill_count(&self) -> usize {
        self.skills.as_ref().map(Vec::len).unwrap_or(0)
    }

    /// 装备节点总数
    pub fn gear_count(&self) -> usize {
        self.gear.as_ref().map(GearArena::len).unwrap_or(0)
    }

    /// 记录摘要（CLI 与日志用）
    pub fn summary(&self) -> String {
        format!(
            "角色: {}, 种族: {}, 装备: {} 件, 技能: {} 项, 肖像: {}",
            self.name.as_deref().unwrap_or("<未命名>"),
            self.metatype.as_deref().unwrap_or("<未知>"),
            self.gear_count(),
            self.skill_count(),
            if self.portrait.is_some() { "有" } else { "无" },
        )
    }
}
