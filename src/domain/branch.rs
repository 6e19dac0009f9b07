/// The branch a release runs on, relative to the configured main branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchContext {
    pub name: String,
    pub is_main: bool,
}

impl BranchContext {
    /// Create a new branch context
    pub fn new(name: impl Into<String>, main_branch: &str) -> Self {
        let name_str = name.into();
        let is_main = name_str == main_branch;

        BranchContext {
            name: name_str,
            is_main,
        }
    }

    /// Check if releases from this branch are expected
    pub fn is_release_branch(&self) -> bool {
        self.is_main
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_branch() {
        let branch = BranchContext::new("main", "main");
        assert!(branch.is_main);
        assert!(branch.is_release_branch());
    }

    #[test]
    fn test_configured_main_branch() {
        let branch = BranchContext::new("trunk", "trunk");
        assert!(branch.is_release_branch());
        assert!(!BranchContext::new("main", "trunk").is_release_branch());
    }

    #[test]
    fn test_feature_branch() {
        let branch = BranchContext::new("feature/login", "main");
        assert!(!branch.is_main);
    }
}
