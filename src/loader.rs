/// 加载器
///
/// 把持久化文档变成内存中的 `CharacterRecord`：
/// 解码字节 → 解析元素树 → 校验版本 → 应用迁移链 → 映射字段 → 解码肖像。
/// 结构性问题（解析失败、版本不支持、字段非法）让整个加载失败，
/// 不返回部分填充的记录；只有肖像解码失败降级为警告。
use std::io::{Error as IoError, ErrorKind};
use std::path::Path;

use crate::character::{CharacterRecord, SkillEntry};
use crate::datatypes::RawText;
use crate::document::{parse_document, Element};
use crate::gear::{GearArena, GearId, GearNode};
use crate::io::{DefaultSheetReader, SheetReader};
use crate::migrate::migrate_to_current;
use crate::portrait::PortraitBlob;
use crate::utils::{LoadWarning, SheetError};
use crate::CURRENT_SCHEMA_VERSION;

/// 加载结果
///
/// 成功加载的记录加上非致命警告（目前只有肖像解码失败一种）。
#[derive(Debug)]
pub struct LoadOutcome {
    /// 完整填充的角色记录
    pub record: CharacterRecord,
    /// 非致命警告，调用方可选择展示
    pub warnings: Vec<LoadWarning>,
}

impl CharacterRecord {
    /// 从文件加载角色记录
    ///
    /// # 参数
    /// * `path` - .chr5 文档路径
    ///
    /// # 返回
    /// 返回记录与警告；所有致命错误都携带来源路径
    ///
    /// # 示例
    /// ```rust,ignore
    /// let outcome = CharacterRecord::load(Path::new("orc_decker.chr5"))?;
    /// println!("{}", outcome.record.summary());
    /// ```
    pub fn load(path: &Path) -> Result<LoadOutcome, SheetError> {
        Self::load_with_reader(path, &DefaultSheetReader)
    }

    /// 使用自定义 Reader 加载（依赖注入，便于测试和替换 IO 实现）
    pub fn load_with_reader(
        path: &Path,
        reader: &dyn SheetReader,
    ) -> Result<LoadOutcome, SheetError> {
        let raw = reader.read(path).map_err(|e| {
            // 底层 IO 错误原样透传，调用方可以区分 NotFound 等错误类别
            match e.downcast::<IoError>() {
                Ok(io_error) => SheetError::IoError(*io_error),
                Err(other) => {
                    SheetError::IoError(IoError::new(ErrorKind::Other, other.to_string()))
                }
            }
        })?;
        Self::from_bytes(&raw.bytes).map_err(|e| e.with_path(path))
    }

    /// 从原始字节加载（编码自动检测）
    pub fn from_bytes(bytes: &[u8]) -> Result<LoadOutcome, SheetError> {
        let decoded = RawText::decode(bytes);
        Self::from_document_text(&decoded.content)
    }

    /// 从已解码的文档文本加载
    pub fn from_document_text(input: &str) -> Result<LoadOutcome, SheetError> {
        let tree = parse_document(input)?;
        let version = declared_version(&tree)?;
        let tree = migrate_to_current(tree, version);
        map_record(tree)
    }
}

/// 读取并校验文档声明的版式版本
///
/// 缺失 `version` 属性按版本 1（最老的受支持版式）处理；
/// 版本 0、非数字或高于当前版本都报 `UnsupportedSchemaVersion`。
fn declared_version(root: &Element) -> Result<u32, SheetError> {
    if root.name != "character" {
        return Err(SheetError::structural(format!(
            "root element must be <character>, found <{}>",
            root.name
        )));
    }

    let raw = match root.attr("version") {
        None => return Ok(1),
        Some(raw) => raw,
    };

    match raw.trim().parse::<u32>() {
        Ok(version) if (1..=CURRENT_SCHEMA_VERSION).contains(&version) => Ok(version),
        _ => Err(SheetError::UnsupportedSchemaVersion {
            path: None,
            version: raw.to_string(),
            supported: CURRENT_SCHEMA_VERSION,
        }),
    }
}

/// 把迁移后的文档树映射为角色记录
fn map_record(tree: Element) -> Result<LoadOutcome, SheetError> {
    let mut record = CharacterRecord::new();
    let mut warnings = Vec::new();

    // 根元素上未知的属性与未知子节点同样保留
    record.extra_attrs = tree
        .attributes
        .into_iter()
        .filter(|(name, _)| name != "version")
        .collect();

    for child in tree.children {
        match child.name.as_str() {
            "name" => {
                ensure_single(record.name.is_none(), "name")?;
                record.name = Some(child.text);
            }
            "metatype" => {
                ensure_single(record.metatype.is_none(), "metatype")?;
                record.metatype = Some(child.text);
            }
            "archetype" => {
                ensure_single(record.archetype.is_none(), "archetype")?;
                record.archetype = Some(child.text);
            }
            "created" => {
                ensure_single(record.created.is_none(), "created")?;
                record.created = Some(parse_created(&child.text)?);
            }
            "gears" => {
                ensure_single(record.gear.is_none(), "gears")?;
                record.gear = Some(map_gears(&child)?);
            }
            "skills" => {
                ensure_single(record.skills.is_none(), "skills")?;
                record.skills = Some(map_skills(&child)?);
            }
            "notes" => {
                ensure_single(record.notes.is_none(), "notes")?;
                record.notes = Some(child.text);
            }
            "mugshot" => {
                ensure_single(record.portrait.is_none(), "mugshot")?;
                if child.text.trim().is_empty() {
                    record.portrait = Some(PortraitBlob::new(Vec::new()));
                } else {
                    match PortraitBlob::decode(&child.text) {
                        Ok(blob) => record.portrait = Some(blob),
                        Err(reason) => {
                            // 解码失败降级为空肖像，节点本身在保存时仍然写出
                            warnings.push(LoadWarning::PortraitDecode { reason });
                            record.portrait = Some(PortraitBlob::new(Vec::new()));
                        }
                    }
                }
            }
            // 扩展袋：未知节点原样保留，保存时原顺序写回
            _ => record.extensions.push(child),
        }
    }

    Ok(LoadOutcome { record, warnings })
}

/// 已知的单值字段出现多次按结构错误处理，不做后者覆盖前者
fn ensure_single(first: bool, name: &str) -> Result<(), SheetError> {
    if first {
        Ok(())
    } else {
        Err(SheetError::structural(format!(
            "duplicate <{}> element",
            name
        )))
    }
}

/// 解析生命周期标志
fn parse_created(text: &str) -> Result<bool, SheetError> {
    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(SheetError::structural(format!(
            "invalid <created> value \"{}\"",
            text
        )))
    }
}

/// 映射装备容器为竞技场树
fn map_gears(container: &Element) -> Result<GearArena, SheetError> {
    let mut arena = GearArena::new();

    for child in &container.children {
        if child.name != "gear" {
            return Err(SheetError::structural(format!(
                "unexpected element <{}> in <gears>",
                child.name
            )));
        }
        let id = map_gear(&mut arena, child)?;
        arena.attach_root(id);
    }

    Ok(arena)
}

/// 映射单个装备元素（递归），返回分配的句柄
fn map_gear(arena: &mut GearArena, element: &Element) -> Result<GearId, SheetError> {
    let guid = element
        .attr("guid")
        .ok_or_else(|| SheetError::structural("<gear> element is missing its guid attribute"))?
        .to_string();

    let quantity = match element.attr("qty") {
        None => None,
        Some(raw) => Some(raw.trim().parse::<u32>().map_err(|_| {
            SheetError::structural(format!("invalid qty \"{}\" on gear {}", raw, guid))
        })?),
    };

    let extra_attrs: Vec<(String, String)> = element
        .attributes
        .iter()
        .filter(|(name, _)| !matches!(name.as_str(), "guid" | "category" | "qty"))
        .cloned()
        .collect();

    let mut node = GearNode {
        guid,
        name: None,
        category: element.attr("category").map(str::to_string),
        quantity,
        extra_attrs,
        extensions: Vec::new(),
        children: Vec::new(),
    };

    let mut nested: Vec<&Element> = Vec::new();
    for child in &element.children {
        match child.name.as_str() {
            "name" => node.name = Some(child.text.clone()),
            "children" => {
                for grandchild in &child.children {
                    if grandchild.name != "gear" {
                        return Err(SheetError::structural(format!(
                            "unexpected element <{}> in gear <children>",
                            grandchild.name
                        )));
                    }
                    nested.push(grandchild);
                }
            }
            _ => node.extensions.push(child.clone()),
        }
    }

    let id = arena.alloc(node);
    for nested_gear in nested {
        let child_id = map_gear(arena, nested_gear)?;
        arena.attach_child(id, child_id);
    }

    Ok(id)
}

/// 映射技能容器为有序列表（文档顺序即存储顺序）
fn map_skills(container: &Element) -> Result<Vec<SkillEntry>, SheetError> {
    let mut skills = Vec::with_capacity(container.children.len());

    for child in &container.children {
        if child.name != "skill" {
            return Err(SheetError::structural(format!(
                "unexpected element <{}> in <skills>",
                child.name
            )));
        }

        let mut name = None;
        let mut rating = None;
        let mut specialization = None;
        let mut extensions = Vec::new();

        // skill 元素没有已知属性，出现的属性全部保留
        let extra_attrs = child.attributes.clone();

        for field in &child.children {
            match field.name.as_str() {
                "name" => name = Some(field.text.clone()),
                "rating" => {
                    let parsed = field.text.trim().parse::<i32>().map_err(|_| {
                        SheetError::structural(format!(
                            "invalid skill rating \"{}\"",
                            field.text
                        ))
                    })?;
                    rating = Some(parsed);
                }
                "spec" => specialization = Some(field.text.clone()),
                _ => extensions.push(field.clone()),
            }
        }

        let name = name.ok_or_else(|| {
            SheetError::structural("<skill> element is missing its <name> child")
        })?;
        let rating = rating.ok_or_else(|| {
            SheetError::structural(format!("skill \"{}\" is missing its <rating> child", name))
        })?;

        skills.push(SkillEntry {
            name,
            rating,
            specialization,
            extra_attrs,
            extensions,
        });
    }

    Ok(skills)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = "<character version=\"3\">\
        <name>Grim</name>\
        <metatype>Ork</metatype>\
        <created>True</created>\
        </character>";

    #[test]
    fn test_load_minimal_document() {
        let outcome = CharacterRecord::from_document_text(MINIMAL).unwrap();
        let record = outcome.record;

        assert_eq!(record.name.as_deref(), Some("Grim"));
        assert_eq!(record.metatype.as_deref(), Some("Ork"));
        assert_eq!(record.created, Some(true));
        assert!(outcome.warnings.is_empty());

        // 文档中不存在的字段保持不存在
        assert!(record.archetype.is_none());
        assert!(record.gear.is_none());
        assert!(record.skills.is_none());
        assert!(record.notes.is_none());
        assert!(record.portrait.is_none());
    }

    #[test]
    fn test_missing_version_defaults_to_oldest() {
        // 无版本标记的文档按 v1 处理：items 经迁移链变成 gears
        let input = "<character><items><item guid=\"g-1\" /></items></character>";
        let outcome = CharacterRecord::from_document_text(input).unwrap();
        assert_eq!(outcome.record.gear_count(), 1);
    }

    #[test]
    fn test_unsupported_version_is_fatal() {
        for input in [
            "<character version=\"0\" />",
            "<character version=\"99\" />",
            "<character version=\"banana\" />",
        ] {
            match CharacterRecord::from_document_text(input) {
                Err(SheetError::UnsupportedSchemaVersion { version, supported, .. }) => {
                    assert!(!version.is_empty());
                    assert_eq!(supported, CURRENT_SCHEMA_VERSION);
                }
                other => panic!("应报版本错误，得到 {:?}", other),
            }
        }
    }

    #[test]
    fn test_wrong_root_element_is_fatal() {
        assert!(CharacterRecord::from_document_text("<creature version=\"3\" />").is_err());
    }

    #[test]
    fn test_gear_tree_structure() {
        let input = "<character version=\"3\"><gears>\
            <gear guid=\"g-deck\" category=\"Electronics\" qty=\"1\"><name>Cyberdeck</name>\
            <children><gear guid=\"g-chip\"><name>Chip</name></gear></children></gear>\
            <gear guid=\"g-pistol\" qty=\"2\" />\
            </gears></character>";
        let outcome = CharacterRecord::from_document_text(input).unwrap();
        let arena = outcome.record.gear.unwrap();

        assert_eq!(arena.roots().len(), 2);
        assert_eq!(arena.len(), 3);
        assert_eq!(arena.max_depth(), 2);

        let deck = arena.get(arena.roots()[0]);
        assert_eq!(deck.guid, "g-deck");
        assert_eq!(deck.category.as_deref(), Some("Electronics"));
        assert_eq!(deck.quantity, Some(1));
        assert_eq!(deck.children.len(), 1);

        let chip = arena.get(deck.children[0]);
        assert_eq!(chip.name.as_deref(), Some("Chip"));
        assert_eq!(chip.quantity, None);
    }

    #[test]
    fn test_gear_without_guid_is_fatal() {
        let input = "<character version=\"3\"><gears><gear qty=\"1\" /></gears></character>";
        assert!(CharacterRecord::from_document_text(input).is_err());
    }

    #[test]
    fn test_skill_order_preserved() {
        let input = "<character version=\"3\"><skills>\
            <skill><name>Zeta</name><rating>2</rating></skill>\
            <skill><name>Alpha</name><rating>6</rating><spec>Exploits</spec></skill>\
            </skills></character>";
        let outcome = CharacterRecord::from_document_text(input).unwrap();
        let skills = outcome.record.skills.unwrap();

        // 保持文档顺序，不做任何排序
        assert_eq!(skills[0].name, "Zeta");
        assert_eq!(skills[1].name, "Alpha");
        assert_eq!(skills[1].specialization.as_deref(), Some("Exploits"));
    }

    #[test]
    fn test_invalid_rating_is_fatal() {
        let input = "<character version=\"3\"><skills>\
            <skill><name>Hacking</name><rating>six</rating></skill>\
            </skills></character>";
        assert!(CharacterRecord::from_document_text(input).is_err());
    }

    #[test]
    fn test_unknown_nodes_go_to_extension_bag() {
        let input = "<character version=\"3\"><name>Grim</name>\
            <cyberdeck_loadout slot=\"1\"><program>Hammer</program></cyberdeck_loadout>\
            </character>";
        let outcome = CharacterRecord::from_document_text(input).unwrap();
        let record = outcome.record;

        assert_eq!(record.extensions.len(), 1);
        assert_eq!(record.extensions[0].name, "cyberdeck_loadout");
        assert_eq!(record.extensions[0].attr("slot"), Some("1"));
    }

    #[test]
    fn test_bad_portrait_degrades_to_warning() {
        let input = "<character version=\"3\"><name>Grim</name>\
            <mugshot>!!!not base64!!!</mugshot></character>";
        let outcome = CharacterRecord::from_document_text(input).unwrap();

        // 解码失败降级为空肖像，字段仍然存在
        assert!(outcome.record.portrait.as_ref().unwrap().is_empty());
        assert_eq!(outcome.warnings.len(), 1);
        assert!(matches!(
            outcome.warnings[0],
            LoadWarning::PortraitDecode { .. }
        ));
        // 其余字段正常加载
        assert_eq!(outcome.record.name.as_deref(), Some("Grim"));
    }

    #[test]
    fn test_unknown_root_attribute_preserved() {
        let input = "<character version=\"3\" campaign=\"Night City\"><name>Grim</name></character>";
        let outcome = CharacterRecord::from_document_text(input).unwrap();

        assert_eq!(
            outcome.record.extra_attrs,
            vec![("campaign".to_string(), "Night City".to_string())]
        );
    }

    #[test]
    fn test_unknown_skill_attribute_preserved() {
        let input = "<character version=\"3\"><skills>\
            <skill source=\"core\"><name>Hacking</name><rating>6</rating></skill>\
            </skills></character>";
        let outcome = CharacterRecord::from_document_text(input).unwrap();
        let skills = outcome.record.skills.unwrap();

        assert_eq!(
            skills[0].extra_attrs,
            vec![("source".to_string(), "core".to_string())]
        );
    }

    #[test]
    fn test_duplicate_singleton_field_is_fatal() {
        for input in [
            "<character version=\"3\"><name>A</name><name>B</name></character>",
            "<character version=\"3\"><gears /><gears /></character>",
            "<character version=\"3\"><mugshot /><mugshot /></character>",
        ] {
            assert!(matches!(
                CharacterRecord::from_document_text(input),
                Err(SheetError::MalformedDocument { .. })
            ));
        }
    }

    #[test]
    fn test_load_missing_file_keeps_io_error_kind() {
        match CharacterRecord::load(std::path::Path::new("no_such_file.chr5")) {
            Err(SheetError::IoError(e)) => {
                assert_eq!(e.kind(), ErrorKind::NotFound);
            }
            other => panic!("应报 IoError，得到 {:?}", other),
        }
    }

    #[test]
    fn test_empty_mugshot_is_empty_portrait() {
        let input = "<character version=\"3\"><mugshot /></character>";
        let outcome = CharacterRecord::from_document_text(input).unwrap();
        assert!(outcome.record.portrait.unwrap().is_empty());
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_malformed_document_is_all_or_nothing() {
        let input = "<character version=\"3\"><name>Grim</name><skills><skill>";
        assert!(matches!(
            CharacterRecord::from_document_text(input),
            Err(SheetError::MalformedDocument { .. })
        ));
    }
}
