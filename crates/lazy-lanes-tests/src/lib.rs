pub mod scenarios;

pub use anyhow;

/// Instantiates the shared scenario suite for one element type.
#[macro_export]
macro_rules! define_engine_tests {
    ($module:ident, $element:ty) => {
        #[cfg(test)]
        mod $module {
            use $crate::scenarios;

            macro_rules! scenario {
                ($name:ident) => {
                    #[test]
                    fn $name() -> $crate::anyhow::Result<()> {
                        scenarios::$name::<$element>()
                    }
                };
            }

            scenario!(mul_add_over_constants);
            scenario!(repeated_operand_sums);
            scenario!(product_chain_reuses_root_operand);
            scenario!(product_of_sum_is_seven);
            scenario!(origin_reused_as_raw_operand);
            scenario!(alternating_products_reach_46);
            scenario!(mixed_sums_reach_39);
            scenario!(mixed_sums_reach_41);
            scenario!(continued_subchain);
            scenario!(chain_times_chain);
            scenario!(shared_origin_subchains);
            scenario!(subtraction_and_division);
            scenario!(bare_variable_is_copied);
            scenario!(repeated_evaluation_is_idempotent);
            scenario!(consecutive_expressions_do_not_leak);
            scenario!(exactly_one_lane);
            scenario!(one_short_of_a_lane);
            scenario!(lazy_matches_eager);
            scenario!(batching_does_not_change_results);
        }
    };
}
