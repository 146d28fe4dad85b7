#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum InsertionMode {
    #[default]
    Initial,
    BeforeHtml,
    BeforeHead,
    InHead,
    InHeadNoscript,
    AfterHead,
    InBody,
    Text,
    InTable,
    InTableText,
    InCaption,
    InColumnGroup,
    InTableBody,
    InRow,
    InCell,
    InSelect,
    InSelectInTable,
    AfterBody,
    InFrameset,
    AfterFrameset,
    AfterAfterBody,
    AfterAfterFrameset,
    TemplateContents,
}

impl InsertionMode {
    /// Modes in which a `<select>` start tag opens "in select in table".
    #[inline]
    pub fn is_table_related(self) -> bool {
        matches!(
            self,
            InsertionMode::InTable
                | InsertionMode::InCaption
                | InsertionMode::InTableBody
                | InsertionMode::InRow
                | InsertionMode::InCell
        )
    }
}
