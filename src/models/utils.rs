use grb::{attr, Model, Result, Var, VarType};
use std::collections::HashMap;
use std::hash::Hash;
use std::ops::Range;

/// An index that can be used to name a variable, e.g. `x_3_1` for the index `(3, 1)`.
pub trait VarIndex {
    fn suffix(&self) -> String;
}

impl VarIndex for usize {
    fn suffix(&self) -> String {
        self.to_string()
    }
}

impl<A: VarIndex, B: VarIndex> VarIndex for (A, B) {
    fn suffix(&self) -> String {
        format!("{}_{}", self.0.suffix(), self.1.suffix())
    }
}

/// Creates one variable for every index in a collection.
pub trait AddVars {
    type Index;
    type Out;

    /// Create a variable with a closure
    fn vars_with<F: FnMut(Self::Index) -> Result<Var>>(&self, func: F) -> Result<Self::Out>;

    /// Create a variable for any type
    fn vars(
        &self,
        model: &mut Model,
        base_name: &str,
        vtype: VarType,
        bounds: &Range<f64>,
    ) -> Result<Self::Out>;

    /// Binary variables
    fn binary(&self, model: &mut Model, base_name: &str) -> Result<Self::Out> {
        self.vars(model, base_name, VarType::Binary, &(0.0..1.0))
    }
}

impl<K> AddVars for [K]
where
    K: VarIndex + Copy + Eq + Hash,
{
    type Index = K;
    type Out = HashMap<K, Var>;

    fn vars_with<F: FnMut(K) -> Result<Var>>(&self, mut func: F) -> Result<Self::Out> {
        let mut map = HashMap::with_capacity(self.len());
        for k in self {
            map.insert(*k, func(*k)?);
        }

        Ok(map)
    }

    fn vars(
        &self,
        model: &mut Model,
        base_name: &str,
        vtype: VarType,
        bounds: &Range<f64>,
    ) -> Result<Self::Out> {
        self.vars_with(|k| {
            model.add_var(
                &format!("{}_{}", base_name, k.suffix()),
                vtype,
                0.0,
                bounds.start,
                bounds.end,
                std::iter::empty(),
            )
        })
    }
}

/// Trait that converts gurobi varaibles to f64
pub trait ConvertVars {
    type Out;
    fn convert(&self, model: &Model) -> grb::Result<Self::Out>;
}

impl<K: Copy + Eq + Hash, T: ConvertVars> ConvertVars for HashMap<K, T> {
    type Out = HashMap<K, T::Out>;

    fn convert(&self, model: &Model) -> grb::Result<Self::Out> {
        let mut out = HashMap::with_capacity(self.len());
        for (k, e) in self {
            out.insert(*k, e.convert(model)?);
        }
        Ok(out)
    }
}

impl ConvertVars for Var {
    type Out = f64;

    fn convert(&self, model: &Model) -> grb::Result<Self::Out> {
        model.get_obj_attr(attr::X, self)
    }
}

#[cfg(test)]
mod tests {
    use super::VarIndex;

    #[test]
    fn variable_names_join_index_parts() {
        assert_eq!(7usize.suffix(), "7");
        assert_eq!((3usize, 1usize).suffix(), "3_1");
        assert_eq!(((1usize, 2usize), 0usize).suffix(), "1_2_0");
    }
}
