//! Prerequisite tables for buildings and units.
//!
//! Names are the server's localized type names. A building can only be
//! produced once every building it lists exists; a unit likewise needs
//! its listed buildings.

/// Building → buildings that must exist first.
pub const BUILDING_PREREQUISITES: &[(&str, &[&str])] = &[
    ("电厂", &[]),
    ("兵营", &["电厂"]),
    ("矿场", &["电厂"]),
    ("车间", &["矿场"]),
    ("雷达", &["矿场"]),
    ("维修中心", &["车间"]),
    ("核电", &["雷达"]),
    ("科技中心", &["车间", "雷达"]),
    ("机场", &["雷达"]),
];

/// Unit → buildings that must exist first.
pub const UNIT_PREREQUISITES: &[(&str, &[&str])] = &[
    ("步兵", &["兵营"]),
    ("火箭兵", &["兵营"]),
    ("工程师", &["兵营"]),
    ("手雷兵", &["兵营"]),
    ("矿车", &["车间"]),
    ("防空车", &["车间"]),
    ("装甲车", &["车间"]),
    ("重坦", &["车间", "维修中心"]),
    ("v2", &["车间", "雷达"]),
    ("猛犸坦克", &["车间", "维修中心", "科技中心"]),
];

fn lookup(table: &'static [(&'static str, &'static [&'static str])], name: &str) -> &'static [&'static str] {
    table
        .iter()
        .find(|(entry, _)| *entry == name)
        .map(|(_, deps)| *deps)
        .unwrap_or(&[])
}

/// Direct prerequisites of a building. Unknown names have none.
pub fn building_prerequisites(building: &str) -> &'static [&'static str] {
    lookup(BUILDING_PREREQUISITES, building)
}

/// Direct prerequisites of a unit. Unknown names have none.
pub fn unit_prerequisites(unit: &str) -> &'static [&'static str] {
    lookup(UNIT_PREREQUISITES, unit)
}

/// Every building needed for `building`, prerequisites first, ending with
/// `building` itself. Each name appears once.
///
/// ```rust
/// assert_eq!(rally::deps::build_order("车间"), ["电厂", "矿场", "车间"]);
/// ```
pub fn build_order(building: &str) -> Vec<&str> {
    let mut order = Vec::new();
    visit(building, &mut order);
    order
}

fn visit<'a>(building: &'a str, order: &mut Vec<&'a str>) {
    if order.contains(&building) {
        return;
    }
    for dep in building_prerequisites(building) {
        visit(dep, order);
    }
    // A cycle in the table would revisit `building` through its own
    // prerequisites; the check keeps it from being listed twice.
    if !order.contains(&building) {
        order.push(building);
    }
}
