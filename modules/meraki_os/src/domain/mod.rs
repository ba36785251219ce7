mod labels;
mod validation;
