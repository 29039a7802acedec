use std::fmt;

/// Named points in a record's lifecycle where hooks run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPoint {
    BeforeCreate,
    AfterCreate,
    BeforeUpdate,
    AfterUpdate,
    BeforeSave,
    AfterSave,
    BeforeDelete,
    AfterDelete,
    AfterFind,
}

impl HookPoint {
    pub const ALL: [HookPoint; 9] = [
        HookPoint::BeforeCreate,
        HookPoint::AfterCreate,
        HookPoint::BeforeUpdate,
        HookPoint::AfterUpdate,
        HookPoint::BeforeSave,
        HookPoint::AfterSave,
        HookPoint::BeforeDelete,
        HookPoint::AfterDelete,
        HookPoint::AfterFind,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            HookPoint::BeforeCreate => "before_create",
            HookPoint::AfterCreate => "after_create",
            HookPoint::BeforeUpdate => "before_update",
            HookPoint::AfterUpdate => "after_update",
            HookPoint::BeforeSave => "before_save",
            HookPoint::AfterSave => "after_save",
            HookPoint::BeforeDelete => "before_delete",
            HookPoint::AfterDelete => "after_delete",
            HookPoint::AfterFind => "after_find",
        }
    }

    /// Whether the hook runs ahead of the write it guards
    pub fn is_before(&self) -> bool {
        matches!(
            self,
            HookPoint::BeforeCreate
                | HookPoint::BeforeUpdate
                | HookPoint::BeforeSave
                | HookPoint::BeforeDelete
        )
    }
}

impl fmt::Display for HookPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Order in which hook points fire for each persistence path
pub(crate) mod flow {
    use super::HookPoint;

    // before_create -> before_save -> INSERT -> after_save -> after_create
    pub const CREATE_BEFORE: [HookPoint; 2] = [HookPoint::BeforeCreate, HookPoint::BeforeSave];
    pub const CREATE_AFTER: [HookPoint; 2] = [HookPoint::AfterSave, HookPoint::AfterCreate];

    // before_update -> before_save -> UPDATE -> after_save -> after_update
    pub const UPDATE_BEFORE: [HookPoint; 2] = [HookPoint::BeforeUpdate, HookPoint::BeforeSave];
    pub const UPDATE_AFTER: [HookPoint; 2] = [HookPoint::AfterSave, HookPoint::AfterUpdate];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hook_point_names() {
        assert_eq!(HookPoint::BeforeCreate.to_string(), "before_create");
        assert_eq!(HookPoint::AfterFind.name(), "after_find");
    }

    #[test]
    fn test_specific_hooks_wrap_save_hooks() {
        assert_eq!(flow::CREATE_BEFORE[0], HookPoint::BeforeCreate);
        assert_eq!(flow::CREATE_AFTER[1], HookPoint::AfterCreate);
        assert_eq!(flow::UPDATE_BEFORE[1], HookPoint::BeforeSave);
        assert_eq!(flow::UPDATE_AFTER[0], HookPoint::AfterSave);
    }

    #[test]
    fn test_before_points() {
        let before: Vec<_> = HookPoint::ALL.iter().filter(|p| p.is_before()).collect();
        assert_eq!(before.len(), 4);
        assert!(!HookPoint::AfterFind.is_before());
    }
}
