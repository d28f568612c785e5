/// 保存器
///
/// 把内存中的 `CharacterRecord` 序列化为规范文档并原子写入。
/// 元素顺序是字段声明顺序的确定性函数，与任何内存迭代顺序无关：
/// 装备树按深度优先前序写出，技能按存储顺序写出，扩展节点按加载
/// 时的出现顺序排在已知字段之后。两次保存同一记录，除 `mugshot`
/// 节点外的输出逐字节相同。
use std::path::Path;

use crate::character::{CharacterRecord, SkillEntry};
use crate::document::{write_document, Element};
use crate::gear::{GearArena, GearId};
use crate::io::{AtomicSheetWriter, SheetWriter};
use crate::utils::SheetError;
use crate::CURRENT_SCHEMA_VERSION;

/// 保存诊断级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticsLevel {
    /// 不收集诊断信息
    Quiet,
    /// 一行摘要
    Standard,
    /// 摘要加各分区明细
    Verbose,
}

/// 保存报告
#[derive(Debug)]
pub struct SaveReport {
    /// 写出的字节数
    pub bytes_written: usize,
    /// 诊断消息（受级别控制）
    pub messages: Vec<String>,
}

impl CharacterRecord {
    /// 构建规范文档树
    ///
    /// `None` 字段不产生节点：加载时不存在的字段保存时同样不存在。
    pub fn to_element(&self) -> Result<Element, SheetError> {
        let mut root = Element::new("character");
        root.set_attr("version", CURRENT_SCHEMA_VERSION.to_string());
        for (name, value) in &self.extra_attrs {
            root.set_attr(name, value.clone());
        }

        if let Some(name) = &self.name {
            root.push_child(Element::with_text("name", name.clone()));
        }
        if let Some(metatype) = &self.metatype {
            root.push_child(Element::with_text("metatype", metatype.clone()));
        }
        if let Some(archetype) = &self.archetype {
            root.push_child(Element::with_text("archetype", archetype.clone()));
        }
        if let Some(created) = self.created {
            let text = if created { "True" } else { "False" };
            root.push_child(Element::with_text("created", text));
        }
        if let Some(arena) = &self.gear {
            root.push_child(gears_to_element(arena));
        }
        if let Some(skills) = &self.skills {
            root.push_child(skills_to_element(skills));
        }
        if let Some(notes) = &self.notes {
            root.push_child(Element::with_text("notes", notes.clone()));
        }
        if let Some(portrait) = &self.portrait {
            if portrait.is_empty() {
                // 空肖像写为空节点，字段存在性随往返保持
                root.push_child(Element::new("mugshot"));
            } else {
                let encoded = portrait.encode()?;
                root.push_child(Element::with_text("mugshot", encoded));
            }
        }

        // 扩展袋写回，保持加载时的出现顺序
        for extension in &self.extensions {
            root.push_child(extension.clone());
        }

        Ok(root)
    }

    /// 序列化为规范文档文本
    pub fn to_document_text(&self) -> Result<String, SheetError> {
        Ok(write_document(&self.to_element()?))
    }

    /// 保存到文件（原子替换）
    ///
    /// # 参数
    /// * `path` - 目标路径
    /// * `level` - 诊断级别
    ///
    /// # 错误
    /// 目标不可写时返回 `PersistFailure`，原文件保持不变。
    pub fn save(&self, path: &Path, level: DiagnosticsLevel) -> Result<SaveReport, SheetError> {
        self.save_with_writer(path, &AtomicSheetWriter, level)
    }

    /// 使用自定义 Writer 保存（依赖注入，便于测试和替换 IO 实现）
    pub fn save_with_writer(
        &self,
        path: &Path,
        writer: &dyn SheetWriter,
        level: DiagnosticsLevel,
    ) -> Result<SaveReport, SheetError> {
        let text = self.to_document_text()?;

        writer.write(&text, path).map_err(|e| SheetError::PersistFailure {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
        })?;

        let mut messages = Vec::new();
        match level {
            DiagnosticsLevel::Quiet => {}
            DiagnosticsLevel::Standard => {
                messages.push(format!("已保存 {:?}: {} 字节", path, text.len()));
            }
            DiagnosticsLevel::Verbose => {
                messages.push(format!("已保存 {:?}: {} 字节", path, text.len()));
                messages.push(format!(
                    "装备 {} 件 (最大嵌套 {} 层), 技能 {} 项, 扩展节点 {} 个",
                    self.gear_count(),
                    self.gear.as_ref().map(GearArena::max_depth).unwrap_or(0),
                    self.skill_count(),
                    self.extensions.len(),
                ));
                if let Some(portrait) = &self.portrait {
                    messages.push(format!("肖像已重新编码: {} 字节原始数据", portrait.len()));
                }
            }
        }

        Ok(SaveReport {
            bytes_written: text.len(),
            messages,
        })
    }
}

/// 装备竞技场 → `<gears>` 元素（深度优先前序）
fn gears_to_element(arena: &GearArena) -> Element {
    let mut container = Element::new("gears");
    for root in arena.roots() {
        container.push_child(gear_to_element(arena, *root));
    }
    container
}

/// 单个装备节点 → `<gear>` 元素（递归）
fn gear_to_element(arena: &GearArena, id: GearId) -> Element {
    let node = arena.get(id);
    let mut element = Element::new("gear");

    element.set_attr("guid", node.guid.clone());
    if let Some(category) = &node.category {
        element.set_attr("category", category.clone());
    }
    if let Some(quantity) = node.quantity {
        element.set_attr("qty", quantity.to_string());
    }
    for (name, value) in &node.extra_attrs {
        element.set_attr(name, value.clone());
    }

    if let Some(name) = &node.name {
        element.push_child(Element::with_text("name", name.clone()));
    }
    for extension in &node.extensions {
        element.push_child(extension.clone());
    }

    if !node.children.is_empty() {
        let mut wrapper = Element::new("children");
        for child in &node.children {
            wrapper.push_child(gear_to_element(arena, *child));
        }
        element.push_child(wrapper);
    }

    element
}

/// 技能列表 → `<skills>` 元素（存储顺序）
fn skills_to_element(skills: &[SkillEntry]) -> Element {
    let mut container = Element::new("skills");
    for skill in skills {
        let mut element = Element::new("skill");
        for (name, value) in &skill.extra_attrs {
            element.set_attr(name, value.clone());
        }
        element.push_child(Element::with_text("name", skill.name.clone()));
        element.push_child(Element::with_text("rating", skill.rating.to_string()));
        if let Some(spec) = &skill.specialization {
            element.push_child(Element::with_text("spec", spec.clone()));
        }
        for extension in &skill.extensions {
            element.push_child(extension.clone());
        }
        container.push_child(element);
    }
    container
}
