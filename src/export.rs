/// 导出器
///
/// 把角色记录投影为某种语言的只读报表文档。导出器只持有记录和
/// 目录的不可变引用，调用之间没有共享可变状态，同一记录可以在
/// 多个线程上按不同语言并发导出。缺失的翻译键回退到内置默认表
/// 并记入诊断列表，绝不让导出失败，也绝不把诊断混入输出文档。
use crate::character::CharacterRecord;
use crate::document::{write_document, Element};
use crate::gear::GearArena;
use crate::localization::{default_string, LocalizationCatalog};

/// 导出诊断
///
/// 缺失的翻译键按首次出现顺序收集，去重。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportDiagnostics {
    /// 目录中缺失、已回退到默认语言的键
    pub missing_keys: Vec<String>,
}

impl ExportDiagnostics {
    fn record_missing(&mut self, key: &str) {
        if !self.missing_keys.iter().any(|k| k == key) {
            self.missing_keys.push(key.to_string());
        }
    }
}

/// 导出结果
#[derive(Debug)]
pub struct ExportOutcome {
    /// 报表文档树
    pub report: Element,
    /// 诊断信息（不嵌入输出）
    pub diagnostics: ExportDiagnostics,
}

impl ExportOutcome {
    /// 渲染为文本（复用规范写入器）
    pub fn to_text(&self) -> String {
        write_document(&self.report)
    }
}

/// 导出器
///
/// 每次导出调用对应一个 (记录, 语言) 组合；目录在整个调用期间
/// 只读，由调用方显式传入而非全局共享。
pub struct Exporter<'a> {
    locale: &'a str,
    catalog: &'a LocalizationCatalog,
}

impl<'a> Exporter<'a> {
    /// 创建导出器
    ///
    /// # 参数
    /// * `locale` - 目标语言标识（写入报表根节点）
    /// * `catalog` - 该语言的翻译目录
    pub fn new(locale: &'a str, catalog: &'a LocalizationCatalog) -> Self {
        Exporter { locale, catalog }
    }

    /// 导出角色记录
    ///
    /// 只读投影：不修改记录，也不修改目录。
    pub fn export(&self, record: &CharacterRecord) -> ExportOutcome {
        let mut diagnostics = ExportDiagnostics::default();
        let mut report = Element::new("report");
        report.set_attr("locale", self.locale);

        report.push_child(Element::with_text(
            "title",
            self.resolve("Title_CharacterSheet", &mut diagnostics),
        ));

        report.push_child(self.identity_section(record, &mut diagnostics));

        if let Some(arena) = &record.gear {
            report.push_child(self.gear_section(arena, &mut diagnostics));
        }
        if let Some(skills) = &record.skills {
            report.push_child(self.skills_section(skills, &mut diagnostics));
        }
        if let Some(notes) = &record.notes {
            let mut section = Element::new("section");
            section.set_attr("title", self.resolve("Section_Notes", &mut diagnostics));
            section.push_child(Element::with_text("text", notes.clone()));
            report.push_child(section);
        }
        if let Some(portrait) = &record.portrait {
            let mut section = Element::new("section");
            section.set_attr("title", self.resolve("Section_Portrait", &mut diagnostics));
            section.set_attr("bytes", portrait.len().to_string());
            report.push_child(section);
        }

        ExportOutcome { report, diagnostics }
    }

    /// 解析翻译键：目录 → 内置默认表 → 键本身
    fn resolve(&self, key: &str, diagnostics: &mut ExportDiagnostics) -> String {
        if let Some(translated) = self.catalog.lookup(key) {
            return translated.to_string();
        }

        diagnostics.record_missing(key);
        match default_string(key) {
            Some(fallback) => fallback.to_string(),
            // 默认表也没有：键本身比空字符串更可诊断
            None => key.to_string(),
        }
    }

    fn identity_section(
        &self,
        record: &CharacterRecord,
        diagnostics: &mut ExportDiagnostics,
    ) -> Element {
        let mut section = Element::new("identity");

        if let Some(name) = &record.name {
            section.push_child(field(
                self.resolve("Label_Name", diagnostics),
                name.clone(),
            ));
        }
        if let Some(metatype) = &record.metatype {
            section.push_child(field(
                self.resolve("Label_Metatype", diagnostics),
                metatype.clone(),
            ));
        }
        if let Some(archetype) = &record.archetype {
            section.push_child(field(
                self.resolve("Label_Archetype", diagnostics),
                archetype.clone(),
            ));
        }
        if let Some(created) = record.created {
            let stage_key = if created { "Stage_Career" } else { "Stage_Build" };
            section.push_child(field(
                self.resolve("Label_Stage", diagnostics),
                self.resolve(stage_key, diagnostics),
            ));
        }

        section
    }

    /// 装备分区：深度优先前序展开，嵌套深度写在 depth 属性上
    fn gear_section(&self, arena: &GearArena, diagnostics: &mut ExportDiagnostics) -> Element {
        let mut section = Element::new("section");
        section.set_attr("title", self.resolve("Section_Gear", diagnostics));

        // 本地化文本只出现在属性值和文本内容里，元素名保持固定，
        // 报表文档因此始终可以重新解析
        section.set_attr("qty_label", self.resolve("Label_Quantity", diagnostics));
        let unnamed = self.resolve("Text_Unnamed", diagnostics);

        for (id, depth) in arena.iter_preorder() {
            let node = arena.get(id);
            let mut item = Element::new("item");
            item.set_attr("depth", depth.to_string());
            if let Some(quantity) = node.quantity {
                item.set_attr("qty", quantity.to_string());
            }
            item.text = node.name.clone().unwrap_or_else(|| unnamed.clone());
            section.push_child(item);
        }

        section
    }

    fn skills_section(
        &self,
        skills: &[crate::character::SkillEntry],
        diagnostics: &mut ExportDiagnostics,
    ) -> Element {
        let mut section = Element::new("section");
        section.set_attr("title", self.resolve("Section_Skills", diagnostics));

        section.set_attr("rating_label", self.resolve("Label_Rating", diagnostics));
        section.set_attr("spec_label", self.resolve("Label_Specialization", diagnostics));

        for skill in skills {
            let mut row = Element::new("row");
            row.push_child(Element::with_text("name", skill.name.clone()));
            row.push_child(Element::with_text("rating", skill.rating.to_string()));
            if let Some(spec) = &skill.specialization {
                row.push_child(Element::with_text("spec", spec.clone()));
            }
            section.push_child(row);
        }

        section
    }
}

/// 标签-值字段
fn field(label: String, value: String) -> Element {
    let mut element = Element::new("field");
    element.set_attr("label", label);
    element.text = value;
    element
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CharacterRecord;

    fn sample_record() -> CharacterRecord {
        CharacterRecord::from_document_text(
            "<character version=\"3\">\
             <name>Grim</name>\
             <metatype>Ork</metatype>\
             <created>True</created>\
             <skills><skill><name>Hacking</name><rating>6</rating><spec>Exploits</spec></skill></skills>\
             </character>",
        )
        .unwrap()
        .record
    }

    fn german_catalog() -> LocalizationCatalog {
        let mut catalog = LocalizationCatalog::new("de");
        catalog.insert("Title_CharacterSheet", "Charakterbogen");
        catalog.insert("Label_Name", "Name");
        catalog.insert("Label_Metatype", "Metatyp");
        catalog.insert("Label_Stage", "Phase");
        catalog.insert("Stage_Career", "Karriere");
        catalog.insert("Section_Skills", "Fertigkeiten");
        catalog.insert("Label_Rating", "Stufe");
        catalog.insert("Label_Specialization", "Spezialisierung");
        catalog
    }

    #[test]
    fn test_export_uses_catalog_translations() {
        let record = sample_record();
        let catalog = german_catalog();
        let outcome = Exporter::new("de", &catalog).export(&record);

        assert_eq!(outcome.report.attr("locale"), Some("de"));
        assert_eq!(outcome.report.child_text("title"), Some("Charakterbogen"));

        let skills = outcome
            .report
            .children
            .iter()
            .find(|c| c.attr("title") == Some("Fertigkeiten"))
            .expect("技能分区应使用德语标题");
        assert_eq!(skills.children.len(), 1);
    }

    #[test]
    fn test_missing_key_falls_back_and_is_diagnosed() {
        let record = sample_record();
        // 空目录：所有键都缺失
        let catalog = LocalizationCatalog::new("fr");
        let outcome = Exporter::new("fr", &catalog).export(&record);

        // 回退到内置英文默认值，而不是失败或输出空串
        assert_eq!(outcome.report.child_text("title"), Some("Character Sheet"));
        assert!(outcome
            .diagnostics
            .missing_keys
            .contains(&"Title_CharacterSheet".to_string()));
        assert!(outcome
            .diagnostics
            .missing_keys
            .contains(&"Section_Skills".to_string()));
    }

    #[test]
    fn test_missing_keys_deduplicated_in_order() {
        let record = sample_record();
        let catalog = LocalizationCatalog::new("fr");
        let outcome = Exporter::new("fr", &catalog).export(&record);

        let mut deduped = outcome.diagnostics.missing_keys.clone();
        deduped.dedup();
        assert_eq!(deduped, outcome.diagnostics.missing_keys);
        assert_eq!(outcome.diagnostics.missing_keys[0], "Title_CharacterSheet");
    }

    #[test]
    fn test_export_does_not_mutate_record() {
        let record = sample_record();
        let before = record.to_document_text().unwrap();

        let catalog = german_catalog();
        let _ = Exporter::new("de", &catalog).export(&record);

        let after = record.to_document_text().unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_gear_section_preserves_preorder() {
        let record = CharacterRecord::from_document_text(
            "<character version=\"3\"><gears>\
             <gear guid=\"g-1\"><name>Deck</name>\
             <children><gear guid=\"g-2\"><name>Chip</name></gear></children></gear>\
             </gears></character>",
        )
        .unwrap()
        .record;

        let catalog = LocalizationCatalog::new("en");
        let outcome = Exporter::new("en", &catalog).export(&record);

        let gear_section = outcome
            .report
            .children
            .iter()
            .find(|c| c.name == "section" && c.attr("title") == Some("Gear"))
            .unwrap();

        let items: Vec<(&str, &str)> = gear_section
            .children
            .iter()
            .map(|item| (item.text.as_str(), item.attr("depth").unwrap_or("?")))
            .collect();
        assert_eq!(items, vec![("Deck", "0"), ("Chip", "1")]);
    }

    #[test]
    fn test_export_renders_to_text() {
        let record = sample_record();
        let catalog = german_catalog();
        let outcome = Exporter::new("de", &catalog).export(&record);

        let text = outcome.to_text();
        assert!(text.contains("Charakterbogen"));
        assert!(text.contains("locale=\"de\""));
    }
}
