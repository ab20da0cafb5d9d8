//! Structured script assembly.
//!
//! The generated script is assembled from named sections rendered in a
//! fixed order. Contributors append lines into a section; the builder owns
//! the ordering, so an insertion point cannot drift relative to the
//! skeleton no matter when its lines are pushed.

/// Sections of the generated script, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Section {
    /// Generated-file docstring.
    Header,
    /// Baseline runtime imports plus plugin import contributions.
    Imports,
    /// Topology function definition and network object construction.
    NetworkInit,
    /// Codegen plugin `pre_network` fragments.
    PreNetwork,
    Hosts,
    Switches,
    Controllers,
    /// Plugin-owned custom component groups.
    CustomComponents,
    Links,
    /// Codegen plugin `post_network` fragments.
    PostNetwork,
    /// Network start statements.
    Start,
    /// Codegen plugin `post_start` fragments.
    PostStart,
    /// Standalone switch configuration, CLI handoff, stop, main block.
    Teardown,
}

impl Section {
    pub const ORDER: [Section; 13] = [
        Section::Header,
        Section::Imports,
        Section::NetworkInit,
        Section::PreNetwork,
        Section::Hosts,
        Section::Switches,
        Section::Controllers,
        Section::CustomComponents,
        Section::Links,
        Section::PostNetwork,
        Section::Start,
        Section::PostStart,
        Section::Teardown,
    ];

    fn index(self) -> usize {
        match self {
            Section::Header => 0,
            Section::Imports => 1,
            Section::NetworkInit => 2,
            Section::PreNetwork => 3,
            Section::Hosts => 4,
            Section::Switches => 5,
            Section::Controllers => 6,
            Section::CustomComponents => 7,
            Section::Links => 8,
            Section::PostNetwork => 9,
            Section::Start => 10,
            Section::PostStart => 11,
            Section::Teardown => 12,
        }
    }
}

/// Line-sequence builder over the fixed section order.
#[derive(Debug)]
pub struct ScriptBuilder {
    sections: [Vec<String>; 13],
}

impl ScriptBuilder {
    pub fn new() -> Self {
        Self {
            sections: std::array::from_fn(|_| Vec::new()),
        }
    }

    pub fn push(&mut self, section: Section, line: impl Into<String>) {
        self.sections[section.index()].push(line.into());
    }

    pub fn extend<I>(&mut self, section: Section, lines: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.sections[section.index()].extend(lines);
    }

    pub fn has_lines(&self, section: Section) -> bool {
        !self.sections[section.index()].is_empty()
    }

    /// Render all sections in their fixed order, one line per entry, with a
    /// trailing newline.
    pub fn render(&self) -> String {
        let mut output = String::new();
        for section in Section::ORDER {
            for line in &self.sections[section.index()] {
                output.push_str(line);
                output.push('\n');
            }
        }
        output
    }
}

impl Default for ScriptBuilder {
    fn default() -> Self {
        Self::new()
    }
}
