use serde::{Deserialize, Serialize};

pub const DEFAULT_GRADE_GROUP: &str = "Khối 6,7,8,9";

/// Classes offered in the class dropdown.
pub const CLASSES: [&str; 7] = ["6", "7", "8", "9", "10", "11", "12"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub name: String,
    pub sub_subjects: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeGroup {
    pub name: String,
    pub subjects: Vec<Subject>,
}

/// Grade group → subject → sub-subjects, kept in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectCatalog {
    groups: Vec<GradeGroup>,
}

impl Default for SubjectCatalog {
    fn default() -> Self {
        let mut catalog = Self { groups: Vec::new() };
        catalog.seed(
            "Khối 6,7,8,9",
            &[
                ("Toán", &["Số học", "Đại số", "Hình học", "Ôn thi vào 10"][..]),
                ("KHTN", &["Vật Lý", "Hóa học", "Sinh học"][..]),
                ("Ngữ Văn", &["Ngữ Văn"][..]),
            ],
        );
        catalog.seed(
            "Khối 10,11,12",
            &[
                ("Toán", &["Số học", "Đại số", "Hình học", "Ôn thi THPT"][..]),
                ("Lý", &["Lý"][..]),
                ("Hóa", &["Hóa"][..]),
                ("Sinh", &["Sinh"][..]),
                ("Sử", &["Sử"][..]),
                ("Địa", &["Địa"][..]),
            ],
        );
        catalog
    }
}

impl SubjectCatalog {
    pub fn empty() -> Self {
        Self { groups: Vec::new() }
    }

    fn seed(&mut self, group: &str, subjects: &[(&str, &[&str])]) {
        self.groups.push(GradeGroup {
            name: group.to_string(),
            subjects: subjects
                .iter()
                .map(|(name, subs)| Subject {
                    name: (*name).to_string(),
                    sub_subjects: subs.iter().map(|s| (*s).to_string()).collect(),
                })
                .collect(),
        });
    }

    pub fn groups(&self) -> &[GradeGroup] {
        &self.groups
    }

    pub fn group(&self, grade_group: &str) -> Option<&GradeGroup> {
        self.groups.iter().find(|g| g.name == grade_group)
    }

    fn group_mut(&mut self, grade_group: &str) -> Option<&mut GradeGroup> {
        self.groups.iter_mut().find(|g| g.name == grade_group)
    }

    /// Subject names selectable in the given grade group.
    pub fn subjects(&self, grade_group: &str) -> Vec<&str> {
        self.group(grade_group)
            .map(|g| g.subjects.iter().map(|s| s.name.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn sub_subjects(&self, grade_group: &str, subject: &str) -> &[String] {
        self.group(grade_group)
            .and_then(|g| g.subjects.iter().find(|s| s.name == subject))
            .map(|s| s.sub_subjects.as_slice())
            .unwrap_or(&[])
    }

    pub fn allows(&self, grade_group: &str, subject: &str, sub_subject: &str) -> bool {
        self.sub_subjects(grade_group, subject)
            .iter()
            .any(|s| s == sub_subject)
    }

    /// Adds an empty subject. Blank names are ignored; an existing subject of
    /// the same name is reset to no sub-subjects. Unknown grade groups are
    /// created on demand.
    pub fn add_subject(&mut self, grade_group: &str, subject: &str) -> bool {
        let name = subject.trim();
        if name.is_empty() {
            return false;
        }
        if self.group(grade_group).is_none() {
            self.groups.push(GradeGroup {
                name: grade_group.to_string(),
                subjects: Vec::new(),
            });
        }
        let Some(group) = self.group_mut(grade_group) else {
            return false;
        };
        match group.subjects.iter_mut().find(|s| s.name == name) {
            Some(existing) => existing.sub_subjects.clear(),
            None => group.subjects.push(Subject {
                name: name.to_string(),
                sub_subjects: Vec::new(),
            }),
        }
        true
    }

    pub fn delete_subject(&mut self, grade_group: &str, subject: &str) -> bool {
        let Some(group) = self.group_mut(grade_group) else {
            return false;
        };
        let before = group.subjects.len();
        group.subjects.retain(|s| s.name != subject);
        group.subjects.len() != before
    }

    pub fn add_sub_subject(&mut self, grade_group: &str, subject: &str, sub_subject: &str) -> bool {
        let name = sub_subject.trim();
        if name.is_empty() {
            return false;
        }
        match self
            .group_mut(grade_group)
            .and_then(|g| g.subjects.iter_mut().find(|s| s.name == subject))
        {
            Some(entry) => {
                entry.sub_subjects.push(name.to_string());
                true
            }
            None => false,
        }
    }

    /// Removes the sub-subject at `index`; out-of-range indices are ignored.
    pub fn delete_sub_subject(&mut self, grade_group: &str, subject: &str, index: usize) -> bool {
        match self
            .group_mut(grade_group)
            .and_then(|g| g.subjects.iter_mut().find(|s| s.name == subject))
        {
            Some(entry) if index < entry.sub_subjects.len() => {
                entry.sub_subjects.remove(index);
                true
            }
            _ => false,
        }
    }
}
