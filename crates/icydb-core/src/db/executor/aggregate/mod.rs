pub(in crate::db::executor) mod capability;
mod contracts;
mod execution;
pub(in crate::db::executor) mod field;

pub(in crate::db::executor) use contracts::{
    AggregateFoldMode, AggregateKind, AggregateOutput, AggregateReducerState, AggregateSpec,
    FoldControl,
};
pub(in crate::db::executor) use execution::{
    AggregateExecutionDescriptor, AggregateFastPathInputs, PreparedAggregateStreamingInputs,
};
