use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown resource '{0}' (expected one of: clientes, itens, servicos, unidades, estoques, os)")]
pub struct UnknownEntity(pub String);
