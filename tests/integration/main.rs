mod cep_test;
mod common;
mod health_test;
