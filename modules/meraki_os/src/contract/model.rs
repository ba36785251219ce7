use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Integer-coded enums travel as plain numbers on the wire.
macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $variant:ident = $code:literal => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "u8", into = "u8")]
        pub enum $name {
            $($(#[$vmeta])* $variant = $code),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl TryFrom<u8> for $name {
            type Error = String;

            fn try_from(code: u8) -> Result<Self, Self::Error> {
                match code {
                    $($code => Ok($name::$variant),)+
                    other => Err(format!("invalid {} code: {other}", stringify!($name))),
                }
            }
        }

        impl From<$name> for u8 {
            fn from(v: $name) -> u8 {
                v as u8
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

wire_enum!(
    /// Individual or company customer.
    TipoPessoa {
        #[default]
        Fisica = 0 => "Física",
        Juridica = 1 => "Jurídica",
    }
);

wire_enum!(
    /// Lifecycle of a service order.
    StatusOs {
        #[default]
        Digitado = 0 => "Digitado",
        Aberto = 1 => "Aberto",
        Execucao = 2 => "Em execução",
        Finalizado = 3 => "Finalizado",
        Cancelado = 4 => "Cancelado",
    }
);

wire_enum!(
    /// Consumption state of an order line.
    StatusOsItem {
        #[default]
        Aberto = 0 => "Aberto",
        Parcial = 1 => "Parcial",
        Finalizado = 2 => "Finalizado",
    }
);

/// `null` deserializes as `T::default()`.
fn nullable<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

// ---------- entities ----------

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DadosCorporativos {
    #[serde(default, deserialize_with = "nullable")]
    pub razao_social: String,
    #[serde(default, deserialize_with = "nullable")]
    pub nome_fantasia: String,
    #[serde(default, deserialize_with = "nullable")]
    pub cnpj: String,
    #[serde(default, deserialize_with = "nullable")]
    pub inscricao_estadual: String,
    #[serde(default, deserialize_with = "nullable")]
    pub inscricao_municipal: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClienteEndereco {
    #[serde(default, deserialize_with = "nullable")]
    pub logradouro: String,
    #[serde(default, deserialize_with = "nullable")]
    pub numero: String,
    #[serde(default, deserialize_with = "nullable")]
    pub complemento: String,
    #[serde(default, deserialize_with = "nullable")]
    pub bairro: String,
    #[serde(default, deserialize_with = "nullable")]
    pub cidade: String,
    #[serde(default, deserialize_with = "nullable")]
    pub uf: String,
    #[serde(default, deserialize_with = "nullable")]
    pub cep: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClienteContato {
    #[serde(default, deserialize_with = "nullable")]
    pub telefone: String,
    #[serde(default, deserialize_with = "nullable")]
    pub celular: String,
    #[serde(default, deserialize_with = "nullable")]
    pub email: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cliente {
    pub id: Uuid,
    #[serde(default)]
    pub identificacao: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub nome: String,
    #[serde(default)]
    pub tipo_pessoa: TipoPessoa,
    #[serde(default, deserialize_with = "nullable")]
    pub cpf: String,
    #[serde(default, alias = "dadosCorporativos", skip_serializing_if = "Option::is_none")]
    pub dados_corporativo: Option<DadosCorporativos>,
    #[serde(default, deserialize_with = "nullable")]
    pub endereco: ClienteEndereco,
    #[serde(default, deserialize_with = "nullable")]
    pub contato: ClienteContato,
}

impl Cliente {
    /// CPF for individuals, CNPJ for companies.
    pub fn documento(&self) -> &str {
        match self.tipo_pessoa {
            TipoPessoa::Fisica => &self.cpf,
            TipoPessoa::Juridica => self
                .dados_corporativo
                .as_ref()
                .map(|d| d.cnpj.as_str())
                .unwrap_or_default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unidade {
    pub id: Uuid,
    #[serde(default, deserialize_with = "nullable")]
    pub sigla: String,
    #[serde(default, deserialize_with = "nullable")]
    pub descricao: String,
    #[serde(default = "active")]
    pub ativo: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: Uuid,
    #[serde(default)]
    pub identificacao: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub descricao: String,
    #[serde(default)]
    pub preco: f64,
    #[serde(default)]
    pub id_unidade: Option<Uuid>,
    #[serde(default = "active")]
    pub ativo: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Servico {
    pub id: Uuid,
    #[serde(default)]
    pub identificacao: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub descricao: String,
    #[serde(default)]
    pub preco: f64,
    #[serde(default = "active")]
    pub ativo: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Estoque {
    pub id: Uuid,
    #[serde(default)]
    pub saldo: f64,
    #[serde(default)]
    pub preco_total: f64,
    pub item: Item,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OsItem {
    pub id: Uuid,
    #[serde(default)]
    pub id_os: Option<Uuid>,
    pub id_item: Uuid,
    #[serde(default)]
    pub preco: f64,
    #[serde(default)]
    pub status: StatusOsItem,
    #[serde(default)]
    pub preco_total: f64,
    #[serde(default)]
    pub preco_total_consumido: f64,
    #[serde(default)]
    pub quantidade: f64,
    #[serde(default)]
    pub quantidade_consumida: f64,
    #[serde(default, deserialize_with = "nullable")]
    pub descricao: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OsServico {
    pub id: Uuid,
    pub id_servico: Uuid,
    #[serde(default)]
    pub preco: f64,
    #[serde(default)]
    pub preco_total: f64,
    #[serde(default)]
    pub preco_total_consumido: f64,
    #[serde(default)]
    pub hora: f64,
    #[serde(default)]
    pub hora_consumida: f64,
    #[serde(default)]
    pub status: StatusOsItem,
    #[serde(default, deserialize_with = "nullable")]
    pub descricao: String,
}

/// Service order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Os {
    pub id: Uuid,
    #[serde(default, with = "datetime")]
    pub data_criacao: Option<NaiveDateTime>,
    #[serde(default, with = "datetime")]
    pub data_inicio: Option<NaiveDateTime>,
    #[serde(default, with = "datetime")]
    pub data_finalizacao: Option<NaiveDateTime>,
    #[serde(default, with = "datetime")]
    pub previsao_entrega: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "nullable")]
    pub observacao: String,
    pub id_cliente: Uuid,
    #[serde(default)]
    pub status: StatusOs,
    #[serde(default)]
    pub desconto: f64,
    #[serde(default)]
    pub valor: f64,
    #[serde(default)]
    pub valor_original: f64,
    #[serde(default)]
    pub valor_final: f64,
    #[serde(default)]
    pub cliente: Option<Cliente>,
    #[serde(default, deserialize_with = "nullable")]
    pub itens: Vec<OsItem>,
    #[serde(default, deserialize_with = "nullable")]
    pub servicos: Vec<OsServico>,
}

fn active() -> bool {
    true
}

// ---------- DTOs ----------

/// Create/update payload of a customer. Address and contact are flattened.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClienteDto {
    pub nome: String,
    pub tipo_pessoa: TipoPessoa,
    pub logradouro: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numero: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complemento: Option<String>,
    pub bairro: String,
    pub cidade: String,
    pub uf: String,
    pub cep: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telefone: Option<String>,
    pub celular: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub razao_social: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nome_fantasia: Option<String>,
    pub cpf: String,
    pub cnpj: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inscricao_estadual: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inscricao_municipal: Option<String>,
}

fn non_blank(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

impl From<&Cliente> for ClienteDto {
    fn from(c: &Cliente) -> Self {
        let corp = c.dados_corporativo.clone().unwrap_or_default();
        Self {
            nome: c.nome.clone(),
            tipo_pessoa: c.tipo_pessoa,
            logradouro: c.endereco.logradouro.clone(),
            numero: non_blank(&c.endereco.numero),
            complemento: non_blank(&c.endereco.complemento),
            bairro: c.endereco.bairro.clone(),
            cidade: c.endereco.cidade.clone(),
            uf: c.endereco.uf.clone(),
            cep: c.endereco.cep.clone(),
            telefone: non_blank(&c.contato.telefone),
            celular: c.contato.celular.clone(),
            email: c.contato.email.clone(),
            razao_social: non_blank(&corp.razao_social),
            nome_fantasia: non_blank(&corp.nome_fantasia),
            cpf: c.cpf.clone(),
            cnpj: corp.cnpj,
            inscricao_estadual: non_blank(&corp.inscricao_estadual),
            inscricao_municipal: non_blank(&corp.inscricao_municipal),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnidadeDto {
    pub sigla: String,
    pub descricao: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDto {
    pub descricao: String,
    pub id_unidade: Option<Uuid>,
    pub preco: f64,
}

impl From<&Item> for ItemDto {
    fn from(i: &Item) -> Self {
        Self {
            descricao: i.descricao.clone(),
            id_unidade: i.id_unidade,
            preco: i.preco,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicoDto {
    pub descricao: String,
    pub preco: f64,
}

impl From<&Servico> for ServicoDto {
    fn from(s: &Servico) -> Self {
        Self {
            descricao: s.descricao.clone(),
            preco: s.preco,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstoqueDto {
    pub saldo: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OsItemDto {
    pub id_item: Uuid,
    pub quantidade: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OsServicoDto {
    pub id_servico: Uuid,
    pub hora: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OsDto {
    pub id_cliente: Option<Uuid>,
    #[serde(default, with = "datetime")]
    pub previsao_entrega: Option<NaiveDateTime>,
    pub observacao: String,
    pub itens: Vec<OsItemDto>,
    pub servicos: Vec<OsServicoDto>,
}

impl From<&Os> for OsDto {
    fn from(os: &Os) -> Self {
        Self {
            id_cliente: Some(os.id_cliente),
            previsao_entrega: os.previsao_entrega,
            observacao: os.observacao.clone(),
            itens: os
                .itens
                .iter()
                .map(|i| OsItemDto {
                    id_item: i.id_item,
                    quantidade: i.quantidade,
                })
                .collect(),
            servicos: os
                .servicos
                .iter()
                .map(|s| OsServicoDto {
                    id_servico: s.id_servico,
                    hora: s.hora,
                })
                .collect(),
        }
    }
}

/// Server timestamps come without an offset (`2024-05-01T10:00:00`), with
/// fractional seconds, as RFC 3339, or as a bare date. Offsets are folded
/// into UTC.
mod datetime {
    use chrono::{DateTime, NaiveDate, NaiveDateTime};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    pub fn serialize<S: Serializer>(v: &Option<NaiveDateTime>, ser: S) -> Result<S::Ok, S::Error> {
        match v {
            Some(dt) => ser.serialize_str(&dt.format(FORMAT).to_string()),
            None => ser.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Option<NaiveDateTime>, D::Error> {
        let Some(raw) = Option::<String>::deserialize(de)? else {
            return Ok(None);
        };
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        parse(raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }

    fn parse(raw: &str) -> Option<NaiveDateTime> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.naive_utc());
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(dt);
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    }
}
