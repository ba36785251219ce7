use console_kit::Labeled;

use crate::contract::model::{Cliente, Item, Servico, Unidade};

impl Labeled for Unidade {
    fn label(&self) -> String {
        self.sigla.clone()
    }
}

impl Labeled for Item {
    fn label(&self) -> String {
        self.descricao.clone()
    }
}

impl Labeled for Servico {
    fn label(&self) -> String {
        self.descricao.clone()
    }
}

impl Labeled for Cliente {
    fn label(&self) -> String {
        self.nome.clone()
    }
}
