mod multiple_next;

pub use multiple_next::MultipleNextRule;
