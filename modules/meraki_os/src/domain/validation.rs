//! Form rules checked before a DTO is sent.

use console_kit::{Validate, ValidationErrors};

use crate::contract::model::{
    ClienteDto, EstoqueDto, ItemDto, OsDto, ServicoDto, TipoPessoa, UnidadeDto,
};

impl Validate for ClienteDto {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors
            .min_chars("nome", &self.nome, 3, "Nome deve ter no mínimo 3 caracteres")
            .require("logradouro", &self.logradouro, "Logradouro é obrigatório")
            .require("bairro", &self.bairro, "Bairro é obrigatório")
            .require("cidade", &self.cidade, "Cidade é obrigatória")
            .exact_chars("uf", &self.uf, 2, "UF deve ter 2 caracteres")
            .min_chars("cep", &self.cep, 8, "CEP inválido")
            .require("celular", &self.celular, "Celular é obrigatório")
            .email("email", &self.email, "Email inválido");

        let documento = match self.tipo_pessoa {
            TipoPessoa::Fisica => &self.cpf,
            TipoPessoa::Juridica => &self.cnpj,
        };
        errors.require(
            "cpf",
            documento,
            "CPF é obrigatório para pessoa física, CNPJ para pessoa jurídica",
        );
        errors.into_result()
    }
}

impl Validate for UnidadeDto {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors
            .require("sigla", &self.sigla, "Sigla é obrigatória.")
            .require("descricao", &self.descricao, "Descrição é obrigatória.");
        errors.into_result()
    }
}

impl Validate for ItemDto {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors
            .require("descricao", &self.descricao, "Descrição é obrigatória.")
            .require_some("idUnidade", self.id_unidade.as_ref(), "Unidade é obrigatória.")
            .check(valid_price(self.preco), "preco", "Preço inválido.");
        errors.into_result()
    }
}

impl Validate for ServicoDto {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors
            .require("descricao", &self.descricao, "Descrição é obrigatória.")
            .check(valid_price(self.preco), "preco", "Preço inválido.");
        errors.into_result()
    }
}

impl Validate for EstoqueDto {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(self.saldo.is_finite(), "saldo", "Saldo inválido.");
        errors.into_result()
    }
}

impl Validate for OsDto {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_some("idCliente", self.id_cliente.as_ref(), "Cliente é obrigatório.");
        for (idx, line) in self.itens.iter().enumerate() {
            errors.check(
                positive(line.quantidade),
                &format!("itens[{idx}].quantidade"),
                "Quantidade deve ser maior que zero.",
            );
        }
        for (idx, line) in self.servicos.iter().enumerate() {
            errors.check(
                positive(line.hora),
                &format!("servicos[{idx}].hora"),
                "Horas devem ser maiores que zero.",
            );
        }
        errors.into_result()
    }
}

fn valid_price(v: f64) -> bool {
    v.is_finite() && v >= 0.0
}

fn positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::model::{OsItemDto, OsServicoDto};
    use uuid::Uuid;

    fn cliente() -> ClienteDto {
        ClienteDto {
            nome: "Ana Souza".into(),
            tipo_pessoa: TipoPessoa::Fisica,
            logradouro: "Rua A".into(),
            bairro: "Centro".into(),
            cidade: "Campinas".into(),
            uf: "SP".into(),
            cep: "13000000".into(),
            celular: "19999999999".into(),
            email: "ana@example.com".into(),
            cpf: "12345678901".into(),
            ..Default::default()
        }
    }

    #[test]
    fn complete_cliente_passes() {
        assert!(cliente().validate().is_ok());
    }

    #[test]
    fn cliente_reports_every_broken_rule() {
        let dto = ClienteDto {
            nome: "An".into(),
            uf: "SPX".into(),
            cep: "1300".into(),
            email: "ana-at-example".into(),
            ..cliente()
        };
        let errors = dto.validate().unwrap_err();
        assert_eq!(errors.len(), 4);
        assert_eq!(errors.field("nome"), Some("Nome deve ter no mínimo 3 caracteres"));
        assert_eq!(errors.field("uf"), Some("UF deve ter 2 caracteres"));
        assert_eq!(errors.field("cep"), Some("CEP inválido"));
        assert_eq!(errors.field("email"), Some("Email inválido"));
    }

    #[test]
    fn company_requires_cnpj_instead_of_cpf() {
        let dto = ClienteDto {
            tipo_pessoa: TipoPessoa::Juridica,
            ..cliente()
        };
        let errors = dto.validate().unwrap_err();
        assert!(errors.field("cpf").unwrap().contains("CNPJ"));

        let dto = ClienteDto {
            tipo_pessoa: TipoPessoa::Juridica,
            cpf: String::new(),
            cnpj: "12345678000199".into(),
            ..cliente()
        };
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn item_needs_unit_and_non_negative_price() {
        let errors = ItemDto {
            descricao: "Parafuso".into(),
            id_unidade: None,
            preco: -1.0,
        }
        .validate()
        .unwrap_err();
        assert_eq!(errors.field("idUnidade"), Some("Unidade é obrigatória."));
        assert_eq!(errors.field("preco"), Some("Preço inválido."));

        assert!(ServicoDto {
            descricao: "Instalação".into(),
            preco: 0.0
        }
        .validate()
        .is_ok());
    }

    #[test]
    fn estoque_rejects_non_finite_balance() {
        assert!(EstoqueDto { saldo: f64::NAN }.validate().is_err());
        assert!(EstoqueDto { saldo: -3.0 }.validate().is_ok());
    }

    #[test]
    fn os_checks_customer_and_line_amounts() {
        let dto = OsDto {
            id_cliente: None,
            itens: vec![OsItemDto {
                id_item: Uuid::new_v4(),
                quantidade: 0.0,
            }],
            servicos: vec![OsServicoDto {
                id_servico: Uuid::new_v4(),
                hora: 1.5,
            }],
            ..Default::default()
        };
        let errors = dto.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.field("idCliente").is_some());
        assert!(errors.field("itens[0].quantidade").is_some());
    }
}
