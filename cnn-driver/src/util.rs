//! Utilities.
use crate::record::{Record, RecordValue};
use anyhow::Result;
use candle_core::{DType, Tensor};
use candle_nn::VarMap;

/// Returns the mean of all elements of a tensor.
pub fn mean(t: &Tensor) -> Result<f32> {
    Ok(t.to_dtype(DType::F32)?.mean_all()?.to_vec0::<f32>()?)
}

/// Returns the (population) standard deviation of all elements of a tensor.
pub fn std(t: &Tensor) -> Result<f32> {
    let t = t.to_dtype(DType::F32)?;
    Ok(t.broadcast_sub(&t.mean_all()?)?
        .powf(2f64)?
        .mean_all()?
        .sqrt()?
        .to_vec0::<f32>()?)
}

/// Returns the mean and standard deviation of the parameters.
///
/// Keys are `{name}_mean` and `{name}_std`.
pub fn param_stats(varmap: &VarMap) -> Result<Record> {
    let mut record = Record::empty();
    let data = varmap
        .data()
        .lock()
        .map_err(|_| anyhow::anyhow!("VarMap lock is poisoned"))?;

    for (k, v) in data.iter() {
        let t = v.as_tensor();
        record.insert(format!("{}_mean", k), RecordValue::Scalar(mean(t)?));
        record.insert(format!("{}_std", k), RecordValue::Scalar(std(t)?));
    }

    Ok(record)
}

/// Returns the number of scalar parameters in a [`VarMap`].
pub fn n_params(varmap: &VarMap) -> usize {
    varmap
        .all_vars()
        .iter()
        .map(|v| v.as_tensor().elem_count())
        .sum()
}
