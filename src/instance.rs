use serde::{Deserialize, Serialize};
use std::fmt;

/// One monitored process instance, as delivered by the instance
/// endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceItem {
    #[serde(default)]
    pub instance_type: String,
    #[serde(default)]
    pub instance: String,
}

impl fmt::Display for InstanceItem {
    /// The filter control's combined select value.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.instance_type, self.instance)
    }
}

/// A contiguous run of instances sharing one type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceGroup {
    pub name: String,
    pub instances: Vec<InstanceItem>,
}

/// Sorts instances by `(instance_type, instance)` and partitions the
/// sorted list at every type change. Concatenating the groups back in
/// order reproduces the sorted input exactly.
pub fn group_instances(mut instances: Vec<InstanceItem>) -> Vec<InstanceGroup> {
    instances.sort_by(|a, b| {
        a.instance_type
            .cmp(&b.instance_type)
            .then_with(|| a.instance.cmp(&b.instance))
    });

    let mut groups: Vec<InstanceGroup> = Vec::new();
    for item in instances {
        match groups.last_mut() {
            Some(group) if group.name == item.instance_type => group.instances.push(item),
            _ => groups.push(InstanceGroup {
                name: item.instance_type.clone(),
                instances: vec![item],
            }),
        }
    }
    groups
}

/// Filter-control companion rule: fall back to the first instance of
/// the first group, but never override an existing choice. The caller
/// re-applies this every time the grouped list changes.
pub fn default_instance<'a>(
    current: Option<&'a InstanceItem>,
    groups: &'a [InstanceGroup],
) -> Option<&'a InstanceItem> {
    if current.is_some() {
        return current;
    }
    groups.first().and_then(|group| group.instances.first())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(instance_type: &str, instance: &str) -> InstanceItem {
        InstanceItem {
            instance_type: instance_type.into(),
            instance: instance.into(),
        }
    }

    #[test]
    fn sorts_by_type_then_instance() {
        let groups = group_instances(vec![
            item("tikv", "10.0.1.2:20180"),
            item("tidb", "10.0.1.9:10080"),
            item("tikv", "10.0.1.1:20180"),
            item("tidb", "10.0.1.3:10080"),
        ]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "tidb");
        assert_eq!(
            groups[0].instances,
            [item("tidb", "10.0.1.3:10080"), item("tidb", "10.0.1.9:10080")]
        );
        assert_eq!(groups[1].name, "tikv");
        assert_eq!(
            groups[1].instances,
            [item("tikv", "10.0.1.1:20180"), item("tikv", "10.0.1.2:20180")]
        );
    }

    #[test]
    fn concatenated_groups_reproduce_sorted_input() {
        let input = vec![
            item("b", "2"),
            item("a", "9"),
            item("b", "1"),
            item("a", "1"),
            item("c", "5"),
        ];
        let mut sorted = input.clone();
        sorted.sort_by(|x, y| {
            x.instance_type
                .cmp(&y.instance_type)
                .then_with(|| x.instance.cmp(&y.instance))
        });

        let groups = group_instances(input);
        let concatenated: Vec<InstanceItem> = groups
            .iter()
            .flat_map(|g| g.instances.iter().cloned())
            .collect();
        assert_eq!(concatenated, sorted);

        // No group name repeats non-contiguously.
        let names: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();
        let mut deduped = names.clone();
        deduped.dedup();
        assert_eq!(names, deduped);
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn empty_input_yields_no_groups() {
        assert!(group_instances(Vec::new()).is_empty());
    }

    #[test]
    fn default_pick_is_first_of_first_group() {
        let groups = group_instances(vec![item("tikv", "x"), item("tidb", "y")]);
        let picked = default_instance(None, &groups).unwrap();
        assert_eq!(picked, &item("tidb", "y"));

        assert_eq!(default_instance(None, &[]), None);
    }

    #[test]
    fn existing_selection_is_never_overridden() {
        let groups = group_instances(vec![item("tidb", "a"), item("tidb", "b")]);
        let current = item("tikv", "z");
        let picked = default_instance(Some(&current), &groups).unwrap();
        assert_eq!(picked, &current);
    }

    #[test]
    fn display_combines_type_and_instance() {
        assert_eq!(item("tidb", "10.0.1.9:10080").to_string(), "tidb - 10.0.1.9:10080");
    }
}
