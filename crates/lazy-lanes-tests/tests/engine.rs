lazy_lanes_tests::define_engine_tests!(f32_engine, f32);
lazy_lanes_tests::define_engine_tests!(f64_engine, f64);
