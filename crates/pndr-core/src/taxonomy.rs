//! The PNDR indicator taxonomy: every published indicator grouped under the
//! policy objective or thematic axis it monitors.
//!
//! Indicator names in the store are free text, so this list is advisory: it
//! tells users which names to ask for, it is not a closed enum the store
//! enforces.

use serde::Serialize;

/// One published indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Indicator {
  /// `Objetivo N` or `Eixo N`.
  pub group: &'static str,
  /// What the objective or axis is about.
  pub theme: &'static str,
  pub name:  &'static str,
}

const fn indicator(
  group: &'static str,
  theme: &'static str,
  name: &'static str,
) -> Indicator {
  Indicator { group, theme, name }
}

/// All indicators, in publication order.
pub static INDICATORS: &[Indicator] = &[
  indicator(
    "Objetivo 1",
    "Convergência de renda",
    "Diferencial entre Salário Médio no Mercado Formal e Mediana Nacional",
  ),
  indicator(
    "Objetivo 1",
    "Convergência de renda",
    "Diferencial entre Índice de Desenvolvimento da Educação Básica (Ideb) e Mediana Nacional",
  ),
  indicator(
    "Objetivo 1",
    "Convergência de renda",
    "Diferencial entre Número de Profissionais de Saúde por Habitante e Mediana Nacional",
  ),
  indicator(
    "Objetivo 1",
    "Convergência de renda",
    "Indicador Composto do Objetivo 1",
  ),
  indicator(
    "Objetivo 2",
    "Cidades Intermediadoras",
    "Índice de Centralidade",
  ),
  indicator(
    "Objetivo 2",
    "Cidades Intermediadoras",
    "Razão de Primazia Populacional Estadual",
  ),
  indicator(
    "Objetivo 2",
    "Cidades Intermediadoras",
    "Razão de Primazia Econômica Estadual",
  ),
  indicator(
    "Objetivo 2",
    "Cidades Intermediadoras",
    "Indicador Composto do Objetivo 2",
  ),
  indicator(
    "Objetivo 3",
    "Competitividade",
    "Percentual de vínculos formais com ensino superior",
  ),
  indicator(
    "Objetivo 3",
    "Competitividade",
    "Salário Médio no Mercado Formal",
  ),
  indicator(
    "Objetivo 3",
    "Competitividade",
    "Taxa de Variação Populacional no Município",
  ),
  indicator(
    "Objetivo 3",
    "Competitividade",
    "Indicador Composto do Objetivo 3",
  ),
  indicator(
    "Objetivo 4",
    "Diversificação",
    "Índice de Especialização do Emprego em Atividades Agrícolas",
  ),
  indicator(
    "Objetivo 4",
    "Diversificação",
    "Índice de Especialização do Emprego em Mineração",
  ),
  indicator(
    "Objetivo 4",
    "Diversificação",
    "Coeficiente de Diversificação Econômica",
  ),
  indicator(
    "Objetivo 4",
    "Diversificação",
    "Indicador Composto do Objetivo 4",
  ),
  indicator(
    "Eixo 1",
    "Educação e capacitação professional",
    "Percentual de escolas com acesso a esgotamento sanitário",
  ),
  indicator(
    "Eixo 1",
    "Educação e capacitação professional",
    "Percentual de escolas com acesso à internet",
  ),
  indicator(
    "Eixo 1",
    "Educação e capacitação professional",
    "Índice de matrículas em Educação Profissional e Tecnológica",
  ),
  indicator(
    "Eixo 1",
    "Educação e capacitação professional",
    "Índice de Desenvolvimento da Educação Básica (Ideb)",
  ),
  indicator(
    "Eixo 1",
    "Educação e capacitação professional",
    "Índice Composto de Educação e Capacitação Professional",
  ),
  indicator(
    "Eixo 2",
    "Ciência, tecnologia e inovação",
    "Número de micro e pequenas empresas relacionadas ao setor de biotecnologia e saúde humana por milhão de habitantes",
  ),
  indicator(
    "Eixo 2",
    "Ciência, tecnologia e inovação",
    "Número de empregos relacionados ao desenvolvimento científico e tecnológico por milhão de habitantes",
  ),
  indicator(
    "Eixo 2",
    "Ciência, tecnologia e inovação",
    "Número de empregos em estabelecimentos relacionadas ao desenvolvimento científico e tecnológico por milhão de habitantes",
  ),
  indicator(
    "Eixo 2",
    "Ciência, tecnologia e inovação",
    "Número de depósitos de patentes por 100 mil habitantes",
  ),
  indicator(
    "Eixo 2",
    "Ciência, tecnologia e inovação",
    "Índice Composto de Ciência, Tecnologia e Inovação",
  ),
  indicator(
    "Eixo 3",
    "Desenvolvimento produtivo",
    "Índice de Complexidade Econômica",
  ),
  indicator(
    "Eixo 3",
    "Desenvolvimento produtivo",
    "Participação do setor industrial no emprego formal",
  ),
  indicator(
    "Eixo 3",
    "Desenvolvimento produtivo",
    "Salário médio no mercado formal",
  ),
  indicator(
    "Eixo 3",
    "Desenvolvimento produtivo",
    "Escala produtiva",
  ),
  indicator(
    "Eixo 3",
    "Desenvolvimento produtivo",
    "Índice Composto de Desenvolvimento Produtivo",
  ),
  indicator(
    "Eixo 4",
    "Infraestrutura",
    "Índice de Atendimento Urbano de Água (IN023)",
  ),
  indicator(
    "Eixo 4",
    "Infraestrutura",
    "Percentual de Acessos de Internet de Alta Velocidade no Município",
  ),
  indicator(
    "Eixo 4",
    "Infraestrutura",
    "Número de Internações Hospitalares por Doenças Relacionadas ao Saneamento Ambiental Inadequado (DRSAI), por 10 mil habitantes",
  ),
  indicator(
    "Eixo 4",
    "Infraestrutura",
    "Despesas nas áreas de habitação e recuperação de áreas degradadas per capita",
  ),
  indicator(
    "Eixo 4",
    "Infraestrutura",
    "Índice Composto de Infraestrutura",
  ),
  indicator(
    "Eixo 5",
    "Desenvolvimento social e acesso a serviços",
    "Desnutrição",
  ),
  indicator(
    "Eixo 5",
    "Desenvolvimento social e acesso a serviços",
    "Percentual de Famílias de Baixa Renda no Cadastro Único",
  ),
  indicator(
    "Eixo 5",
    "Desenvolvimento social e acesso a serviços",
    "Distorção Idade-Série",
  ),
  indicator(
    "Eixo 5",
    "Desenvolvimento social e acesso a serviços",
    "Diferencial Salarial Médio Feminino no Mercado de Trabalho Formal",
  ),
  indicator(
    "Eixo 5",
    "Desenvolvimento social e acesso a serviços",
    "Índice Composto de Desenvolvimento Social e Acesso a Serviços",
  ),
  indicator(
    "Eixo 6",
    "Sustentabilidade",
    "Número de Empregos em Estabelecimentos Relacionados a Reciclagem e Gestão de Resíduos",
  ),
  indicator(
    "Eixo 6",
    "Sustentabilidade",
    "Percentual de Área Desmatada no Município",
  ),
  indicator(
    "Eixo 6",
    "Sustentabilidade",
    "Taxa de Desmatamento (km2/ano)",
  ),
  indicator(
    "Eixo 6",
    "Sustentabilidade",
    "Emissões Líquidas de Gases de Efeito Estufa (CO2 Equivalente) da Agropecuária e Processos Industriais.",
  ),
  indicator(
    "Eixo 6",
    "Sustentabilidade",
    "Índice Composto de Sustentabilidade",
  ),
  indicator(
    "Eixo 7",
    "Fortalecimento das capacidades governativas dos entes subnacionais",
    "Percentual de dirigentes municipais com ensino superior completo na administração pública.",
  ),
  indicator(
    "Eixo 7",
    "Fortalecimento das capacidades governativas dos entes subnacionais",
    "Percentual de servidores municipais com ensino superior completo na administração pública",
  ),
  indicator(
    "Eixo 7",
    "Fortalecimento das capacidades governativas dos entes subnacionais",
    "Salário médio municipal de servidores da administração pública",
  ),
  indicator(
    "Eixo 7",
    "Fortalecimento das capacidades governativas dos entes subnacionais",
    "Índice de Sustentabilidade Fiscal dos Municípios",
  ),
  indicator(
    "Eixo 7",
    "Fortalecimento das capacidades governativas dos entes subnacionais",
    "Índice Composto de Fortalecimento das Capacidades Governativas dos Entes Subnacionais",
  ),
];

/// Indicators whose name contains `needle`, ignoring case.
pub fn search(needle: &str) -> impl Iterator<Item = &'static Indicator> + '_ {
  let needle = needle.to_lowercase();
  INDICATORS
    .iter()
    .filter(move |i| i.name.to_lowercase().contains(&needle))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn four_objectives_and_seven_axes() {
    assert_eq!(INDICATORS.len(), 51);
    let objectives = INDICATORS.iter().filter(|i| i.group.starts_with("Objetivo"));
    assert_eq!(objectives.count(), 16);
    assert!(INDICATORS.iter().any(|i| i.group == "Eixo 7"));
  }

  #[test]
  fn search_is_case_insensitive() {
    let hits: Vec<_> = search("sustentabilidade fiscal").collect();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].group, "Eixo 7");
    assert!(search("desmat").count() >= 2);
  }
}
