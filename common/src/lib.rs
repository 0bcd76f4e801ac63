pub mod filter;
pub mod filter_codec;

pub use filter::{
    build_condition, default_operator, default_translation, generate, generate_explanation,
    get_condition_explanation, new_condition, parse, Condition, ConditionValue, Connector,
    FieldConfig, FieldType, FilterOperator, StatusOption,
};
pub use filter_codec::{decode_filter, encode_filter, FilterCodecError};

/// One day in milliseconds, the width of a date equality range.
pub const DAY_MILLIS: i64 = 86_400_000;
