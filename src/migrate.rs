/// 版式迁移模块
///
/// 旧版本文档通过一条有序的纯变换链升级到当前版式。
/// 每一步是一个 `Element -> Element` 的纯函数，只整形文档树，
/// 不解释字段语义；加载器在映射字段之前按顺序应用缺失的步骤。
use crate::document::Element;

/// 单个迁移步骤
pub struct Migration {
    /// 输入版式版本
    pub from: u32,
    /// 输出版式版本
    pub to: u32,
    /// 变更说明
    pub description: &'static str,
    /// 纯树变换
    pub apply: fn(Element) -> Element,
}

/// 迁移链，按版本升序排列
///
/// 不变量：`MIGRATIONS[i].to == MIGRATIONS[i + 1].from`，
/// 链尾的 `to` 等于 `CURRENT_SCHEMA_VERSION`。
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        from: 1,
        to: 2,
        description: "items/item 重命名为 gears/gear；portrait 重命名为 mugshot",
        apply: migrate_v1_to_v2,
    },
    Migration {
        from: 2,
        to: 3,
        description: "skill/specialization 重命名为 spec；嵌套 gear 移入 children 包装节点",
        apply: migrate_v2_to_v3,
    },
];

/// 将指定版本的文档树迁移到当前版式
///
/// # 参数
/// * `tree` - 解析后的文档树
/// * `version` - 文档声明的版式版本（调用方已验证在支持范围内）
pub fn migrate_to_current(mut tree: Element, version: u32) -> Element {
    for step in MIGRATIONS {
        if step.from >= version {
            tree = (step.apply)(tree);
        }
    }
    tree
}

/// v1 -> v2
///
/// - 根级 `items` 容器改名 `gears`，其中所有层级的 `item` 改名 `gear`
/// - 根级 `portrait` 叶子改名 `mugshot`
fn migrate_v1_to_v2(mut root: Element) -> Element {
    for child in &mut root.children {
        if child.name == "items" {
            child.name = "gears".to_string();
            rename_recursive(child, "item", "gear");
        } else if child.name == "portrait" {
            child.name = "mugshot".to_string();
        }
    }
    root
}

/// v2 -> v3
///
/// - `skills/skill/specialization` 改名 `spec`
/// - 直接挂在 `gear` 下的嵌套 `gear` 移动到 `children` 包装节点中，
///   保持相对顺序
fn migrate_v2_to_v3(mut root: Element) -> Element {
    for child in &mut root.children {
        match child.name.as_str() {
            "skills" => {
                for skill in child.children.iter_mut().filter(|c| c.name == "skill") {
                    if let Some(spec) = skill.find_child_mut("specialization") {
                        spec.name = "spec".to_string();
                    }
                }
            }
            "gears" => {
                for gear in child.children.iter_mut().filter(|c| c.name == "gear") {
                    wrap_nested_gear(gear);
                }
            }
            _ => {}
        }
    }
    root
}

/// 在整棵子树中重命名元素
fn rename_recursive(element: &mut Element, from: &str, to: &str) {
    for child in &mut element.children {
        if child.name == from {
            child.name = to.to_string();
        }
        rename_recursive(child, from, to);
    }
}

/// 把直接嵌套的 `gear` 子元素移入 `children` 包装节点（递归）
fn wrap_nested_gear(gear: &mut Element) {
    let mut nested: Vec<Element> = Vec::new();
    let mut kept: Vec<Element> = Vec::new();

    for child in gear.children.drain(..) {
        if child.name == "gear" {
            nested.push(child);
        } else {
            kept.push(child);
        }
    }
    gear.children = kept;

    if !nested.is_empty() {
        let mut wrapper = match gear.find_child("children") {
            Some(_) => {
                // 已有包装节点：取出后追加（保持原有子项在前）
                let position = gear
                    .children
                    .iter()
                    .position(|c| c.name == "children")
                    .unwrap_or(gear.children.len());
                gear.children.remove(position)
            }
            None => Element::new("children"),
        };
        wrapper.children.extend(nested);
        gear.push_child(wrapper);
    }

    // 递归处理已在包装节点内的 gear
    if let Some(wrapper) = gear.find_child_mut("children") {
        for nested_gear in wrapper.children.iter_mut().filter(|c| c.name == "gear") {
            wrap_nested_gear(nested_gear);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse_document;
    use crate::CURRENT_SCHEMA_VERSION;

    #[test]
    fn test_chain_is_contiguous() {
        for window in MIGRATIONS.windows(2) {
            assert_eq!(window[0].to, window[1].from, "迁移链断裂");
        }
        assert_eq!(MIGRATIONS.last().unwrap().to, CURRENT_SCHEMA_VERSION);
        assert_eq!(MIGRATIONS.first().unwrap().from, 1);
    }

    #[test]
    fn test_v1_renames_items_and_portrait() {
        let input = "<character version=\"1\">\
            <items><item guid=\"g-1\"><item guid=\"g-2\" /></item></items>\
            <portrait>AAAA</portrait>\
            </character>";
        let tree = parse_document(input).unwrap();
        let migrated = migrate_to_current(tree, 1);

        let gears = migrated.find_child("gears").expect("items 应改名为 gears");
        let outer = gears.find_child("gear").expect("item 应改名为 gear");
        assert_eq!(outer.attr("guid"), Some("g-1"));
        assert!(migrated.find_child("mugshot").is_some());
        assert!(migrated.find_child("portrait").is_none());

        // v2->v3 也随链应用：嵌套 gear 进入 children 包装节点
        let wrapper = outer.find_child("children").expect("嵌套 gear 应有包装节点");
        assert_eq!(wrapper.find_child("gear").unwrap().attr("guid"), Some("g-2"));
    }

    #[test]
    fn test_v2_renames_specialization() {
        let input = "<character version=\"2\">\
            <skills><skill><name>Hacking</name><specialization>Exploits</specialization></skill></skills>\
            </character>";
        let tree = parse_document(input).unwrap();
        let migrated = migrate_to_current(tree, 2);

        let skill = migrated.find_child("skills").unwrap().find_child("skill").unwrap();
        assert_eq!(skill.child_text("spec"), Some("Exploits"));
        assert!(skill.find_child("specialization").is_none());
    }

    #[test]
    fn test_v2_wrap_preserves_sibling_order() {
        let input = "<character version=\"2\"><gears>\
            <gear guid=\"p\"><name>Parent</name>\
            <gear guid=\"c1\" /><gear guid=\"c2\" /></gear>\
            </gears></character>";
        let tree = parse_document(input).unwrap();
        let migrated = migrate_to_current(tree, 2);

        let parent = migrated.find_child("gears").unwrap().find_child("gear").unwrap();
        assert_eq!(parent.child_text("name"), Some("Parent"));

        let wrapper = parent.find_child("children").unwrap();
        let guids: Vec<&str> = wrapper
            .find_children("gear")
            .filter_map(|g| g.attr("guid"))
            .collect();
        assert_eq!(guids, vec!["c1", "c2"]);
    }

    #[test]
    fn test_current_version_untouched() {
        let input = "<character version=\"3\"><name>Grim</name></character>";
        let tree = parse_document(input).unwrap();
        let migrated = migrate_to_current(tree.clone(), CURRENT_SCHEMA_VERSION);
        assert_eq!(migrated, tree);
    }
}
