//! Fixtures shared by the micro-proxy benchmarks.

/// One benchmark input and how many decoder items it yields.
#[derive(Debug, Copy, Clone)]
pub struct TestCase {
    name: &'static str,
    group: TestGroup,
    file: TestFile,
    items: usize,
}

impl TestCase {
    pub fn new(name: &'static str, group: TestGroup, file: TestFile, items: usize) -> Self {
        Self { name, group, file, items }
    }

    /// A head without body: the head item and the end of the empty payload.
    pub fn head_only(name: &'static str, group: TestGroup, file: TestFile) -> Self {
        Self::new(name, group, file, 2)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn group(&self) -> TestGroup {
        self.group
    }

    pub fn file(&self) -> &TestFile {
        &self.file
    }

    /// Number of items a decoder hands out for the whole input.
    pub fn items(&self) -> usize {
        self.items
    }

    /// `group/name`, used as benchmark id.
    pub fn id(&self) -> String {
        format!("{}/{}", self.group.as_str(), self.name)
    }
}

#[derive(Debug, Copy, Clone)]
pub struct TestFile {
    file_name: &'static str,
    content: &'static str,
}

impl TestFile {
    pub const fn new(file_name: &'static str, content: &'static str) -> Self {
        Self { file_name, content }
    }

    pub fn content(&self) -> &'static str {
        self.content
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn file_name(&self) -> &'static str {
        self.file_name
    }
}

#[derive(Clone, Copy, Debug)]
pub enum TestGroup {
    Small,
    Normal,
    Large,
}

impl TestGroup {
    pub fn as_str(self) -> &'static str {
        match self {
            TestGroup::Small => "small",
            TestGroup::Normal => "normal",
            TestGroup::Large => "large",
        }
    }
}
