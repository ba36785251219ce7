pub mod debounce;
pub mod list;
pub mod source;
pub mod typeahead;
